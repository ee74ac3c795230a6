//! The injected SPI/chip-select boundary.
//!
//! The LTC6810 daisy chain is reached through four primitives: two data
//! shifts and two chip-select edges. The source this engine is based on
//! passed these in as four raw function pointers and, across its many
//! header snapshots, disagreed with itself about which edge "turn_on" and
//! "turn_off" actually drove. `Link` replaces both problems with one small
//! trait and a single, documented convention:
//!
//! - `cs_assert` selects the chain (drives chip-select active).
//! - `cs_deassert` releases it (chip-select idle).
//!
//! Every [`crate::transport::Transport`] operation begins with `cs_assert`
//! and ends with `cs_deassert`, with one deliberate exception documented on
//! [`crate::transport::Transport::is_conversion_done`].
pub trait Link {
    /// Error type surfaced by a failed shift; treated the same as a PEC
    /// failure by callers (see the crate-level error handling notes).
    type Error: core::fmt::Debug;

    /// Shifts `buf` out over SPI.
    fn spi_transmit(&mut self, buf: &[u8]) -> Result<(), Self::Error>;

    /// Shifts `buf.len()` bytes in over SPI.
    fn spi_receive(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Selects the daisy chain for a transaction.
    fn cs_assert(&mut self);

    /// Releases the daisy chain.
    fn cs_deassert(&mut self);
}

/// Adapts a blocking `embedded-hal` 0.2 SPI bus plus an `OutputPin` chip
/// select into a [`Link`]. Real hardware integrations plug in through this;
/// host-side tests use a fake `Link` directly instead.
pub struct HalLink<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> HalLink<SPI, CS> {
    pub fn new(spi: SPI, cs: CS) -> Self {
        HalLink { spi, cs }
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

/// Error type for [`HalLink`]: either the SPI bus or the chip-select pin
/// failed. `embedded-hal` 0.2's `OutputPin` error type is associated, so it
/// is threaded through here rather than boxed away.
#[derive(Debug)]
pub enum HalLinkError<SpiError, PinError> {
    Spi(SpiError),
    Pin(PinError),
}

impl<SPI, CS> Link for HalLink<SPI, CS>
where
    SPI: embedded_hal::blocking::spi::Write<u8> + embedded_hal::blocking::spi::Transfer<u8>,
    CS: embedded_hal::digital::v2::OutputPin,
{
    type Error = HalLinkError<
        <SPI as embedded_hal::blocking::spi::Write<u8>>::Error,
        <CS as embedded_hal::digital::v2::OutputPin>::Error,
    >;

    fn spi_transmit(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        self.spi.write(buf).map_err(HalLinkError::Spi)
    }

    fn spi_receive(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.spi.transfer(buf).map(|_| ()).map_err(HalLinkError::Spi)
    }

    fn cs_assert(&mut self) {
        let _ = self.cs.set_low();
    }

    fn cs_deassert(&mut self) {
        let _ = self.cs.set_high();
    }
}
