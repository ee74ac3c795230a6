//! Wake-up, chip-select framing, and daisy-chain command/register shifting.

use crate::link::Link;
use crate::pec::verify_register;

/// A raw 8-byte register group as it comes off the wire: 6 data bytes
/// followed by a 2-byte PEC. Framing/verification lives in [`crate::pec`];
/// this alias exists purely for readability at the transport boundary.
pub type RawRegister = [u8; 8];

/// Number of padding bytes that shift through the chain before the
/// conversion-done flag appears, for a chain of `n` devices.
const fn padding_bytes(n: usize) -> usize {
    (n + 7) / 8 + 1
}

/// Shifts commands and register groups across a daisy chain of `N` LTC6810s
/// reachable through `L`.
pub struct Transport<L: Link, const N: usize> {
    link: L,
    /// `true` once [`Transport::start_conversion`] has opened a transaction
    /// that [`Transport::is_conversion_done`] has not yet closed.
    conversion_open: bool,
}

impl<L: Link, const N: usize> Transport<L, N> {
    pub fn new(link: L) -> Self {
        Transport {
            link,
            conversion_open: false,
        }
    }

    pub fn release(self) -> L {
        self.link
    }

    /// Generates the N wake pulses the daisy chain needs to come out of
    /// sleep: one assert/transmit/deassert cycle per device.
    pub fn wake_up(&mut self) {
        for _ in 0..N {
            self.link.cs_assert();
            let _ = self.link.spi_transmit(&[0xFF]);
            self.link.cs_deassert();
        }
    }

    /// Broadcasts a framed command with no payload and no response.
    pub fn send(&mut self, cmd: [u8; 4]) {
        self.link.cs_assert();
        let _ = self.link.spi_transmit(&cmd);
        self.link.cs_deassert();
    }

    /// Broadcasts a framed command followed by a framed register group.
    pub fn write(&mut self, cmd: [u8; 4], reg: [u8; 8]) {
        self.link.cs_assert();
        let _ = self.link.spi_transmit(&cmd);
        let _ = self.link.spi_transmit(&reg);
        self.link.cs_deassert();
    }

    /// Issues `cmd` and reads back one 8-byte register group per device, in
    /// chain order.
    pub fn read(&mut self, cmd: [u8; 4]) -> [RawRegister; N] {
        let mut groups = [[0u8; 8]; N];
        self.link.cs_assert();
        let _ = self.link.spi_transmit(&cmd);
        for group in groups.iter_mut() {
            let _ = self.link.spi_receive(group);
        }
        self.link.cs_deassert();
        groups
    }

    /// Starts a conversion command and leaves the transaction open for
    /// [`Transport::is_conversion_done`] to poll. Does not deassert CS.
    pub fn start_conversion_raw(&mut self, cmd: [u8; 4]) {
        self.link.cs_assert();
        let _ = self.link.spi_transmit(&cmd);
        self.conversion_open = true;
    }

    /// Polls the conversion started by [`Transport::start_conversion`].
    ///
    /// This is the one protocol corner where the chain is held selected
    /// across calls: the padding bytes that precede the done-flag byte only
    /// make sense as one continuous shift. Returning `false` leaves CS
    /// asserted so the next call continues the same conversation; returning
    /// `true` closes it.
    pub fn is_conversion_done(&mut self) -> bool {
        debug_assert!(
            self.conversion_open,
            "is_conversion_done polled without an open start_conversion"
        );
        let mut scratch = [0u8; 1];
        let mut done = false;
        for _ in 0..padding_bytes(N) {
            let _ = self.link.spi_receive(&mut scratch);
            if scratch[0] != 0 {
                done = true;
            }
        }
        if done {
            self.link.cs_deassert();
            self.conversion_open = false;
        }
        done
    }
}

/// Verifies every register group in a chain-order array, returning an
/// array of `Option` the way the driver layer wants it: `Some(group)` when
/// the PEC checks out, `None` otherwise.
pub fn verify_all<const N: usize>(groups: [RawRegister; N]) -> [Option<RawRegister>; N] {
    let mut out = [None; N];
    for (slot, group) in out.iter_mut().zip(groups.into_iter()) {
        *slot = verify_register(group).then_some(group);
    }
    out
}
