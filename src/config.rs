//! Constructor-time configuration for [`crate::supervisor::Supervisor`].

/// Bundles the acquisition engine's constructor-time parameters, the way
/// the reference firmware's peripheral wrappers take a small settings
/// struct instead of a long argument list.
pub struct Config {
    /// Target sampling period, in microseconds.
    pub period_us: u32,
    /// Diagnostics sliding-window span, in milliseconds.
    pub window_ms: u32,
    /// Selects the CFG register's REFON bit (0x7C vs 0x78 first byte).
    pub refon: bool,
    /// Monotonic tick source; may wrap.
    pub tick: fn() -> i32,
    /// Microseconds represented by one tick.
    pub tick_resolution_us: u32,
}
