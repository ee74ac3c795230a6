//! The per-front-end measurement entity.

/// One LTC6810-class battery-monitor IC's latest measurements.
///
/// `conv_rate` is a read-only mirror of this device's windowed success rate
/// in [`crate::diagnostics::Diagnostics`] — see the crate's design notes for
/// why the two are not independent fields.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrontEnd {
    pub cells: [f32; 6],
    pub gpios: [f32; 4],
    pub total_voltage: f32,
    pub conv_rate: f32,
}

impl FrontEnd {
    pub const fn new() -> Self {
        FrontEnd {
            cells: [0.0; 6],
            gpios: [0.0; 4],
            total_voltage: 0.0,
            conv_rate: 1.0,
        }
    }
}

impl Default for FrontEnd {
    fn default() -> Self {
        Self::new()
    }
}
