//! Wires the state machine kernel around the device driver: scheduling
//! conversions, reads, sleep/standby timing, and diagnostics.

use crate::config::Config;
use crate::device::FrontEnd;
use crate::diagnostics::{window_len_from, Diagnostics};
use crate::driver::Driver;
use crate::kernel::{Kernel, StateIndex, Transition};
use crate::link::Link;

/// Time the chain is allowed to idle in STANDBY before dropping back to
/// SLEEP, in microseconds.
const TIME_SLEEP_US: i64 = 1_800_000;

/// Signed, wraparound-safe microsecond delta: `current - reference`,
/// computed with `wrapping_sub` on the unsigned counters and reinterpreted
/// as signed, the classic jiffy-comparison idiom for a tick source that may
/// roll over.
fn elapsed_us(current: u32, reference: u32) -> i32 {
    current.wrapping_sub(reference) as i32
}

/// The six-state acquisition cycle. Declared order fixes each variant's
/// [`StateIndex::index`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcqState {
    Sleep,
    Standby,
    MeasuringCells,
    ReadingCells,
    MeasuringGpios,
    ReadingGpios,
}

impl StateIndex for AcqState {
    const COUNT: usize = 6;
    fn index(&self) -> usize {
        *self as usize
    }
}

/// The context the kernel mutates: the driver, one [`FrontEnd`] per chain
/// position, diagnostics, and the timestamps the guards compare.
pub struct Engine<L: Link, const N: usize> {
    driver: Driver<L, N>,
    fronts: [FrontEnd; N],
    diagnostics: Diagnostics<N>,
    current_time: u32,
    sleep_reference: u32,
    last_read: u32,
    init_conv: u32,
    final_conv: u32,
    period_us: u32,
    tick: fn() -> i32,
    tick_resolution_us: u32,
}

fn sleep_action<L: Link, const N: usize>(_ctx: &mut Engine<L, N>) {}

fn standby_action<L: Link, const N: usize>(ctx: &mut Engine<L, N>) {
    ctx.sleep_reference = ctx.current_time;
}

fn measuring_cells_action<L: Link, const N: usize>(ctx: &mut Engine<L, N>) {
    ctx.init_conv = ctx.current_time;
    ctx.driver.start_cell_conversion();
}

fn reading_cells_action<L: Link, const N: usize>(ctx: &mut Engine<L, N>) {
    let cells = ctx.driver.read_cells();
    for i in 0..N {
        for slot in 0..6 {
            match cells[i][slot] {
                Some(v) => {
                    ctx.fronts[i].cells[slot] = v;
                    ctx.diagnostics.record(i, true);
                }
                None => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("device {} cell register: PEC mismatch", i);
                    ctx.diagnostics.record(i, false);
                }
            }
        }
        if let Some(total) = cells[i][6] {
            ctx.fronts[i].total_voltage = total;
        } else {
            #[cfg(feature = "defmt")]
            defmt::trace!("device {} status register: PEC mismatch", i);
        }
        ctx.fronts[i].conv_rate = ctx.diagnostics.success_rate(i);
    }
}

fn measuring_gpios_action<L: Link, const N: usize>(ctx: &mut Engine<L, N>) {
    ctx.driver.start_gpio_conversion();
}

fn reading_gpios_action<L: Link, const N: usize>(ctx: &mut Engine<L, N>) {
    let gpios = ctx.driver.read_gpios();
    for i in 0..N {
        for slot in 0..4 {
            match gpios[i][slot] {
                Some(v) => {
                    ctx.fronts[i].gpios[slot] = v;
                    ctx.diagnostics.record(i, true);
                }
                None => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("device {} GPIO register: PEC mismatch", i);
                    ctx.diagnostics.record(i, false);
                }
            }
        }
        ctx.fronts[i].conv_rate = ctx.diagnostics.success_rate(i);
    }

    ctx.final_conv = ctx.current_time;
    ctx.diagnostics.time_to_read_us = elapsed_us(ctx.final_conv, ctx.init_conv).max(0) as u32;
    let reading_period = elapsed_us(ctx.current_time, ctx.last_read).max(0) as u32;
    ctx.diagnostics.reading_period_us = reading_period;
    ctx.last_read = ctx.current_time;

    if (reading_period as u64) * 10 > (ctx.period_us as u64) * 11 {
        #[cfg(feature = "defmt")]
        defmt::warn!(
            "reading period {} us exceeded 110% of target {} us, stepping ADC mode faster",
            reading_period,
            ctx.period_us
        );
        ctx.driver.faster_conv();
    }
}

/// `current - last_read >= period_us - time_to_read`. This is the one
/// guard with a side effect: on the true branch it wakes the chain before
/// reporting true, so wake-up happens exactly once per sleep→measure
/// transition.
fn sleep_to_measuring_cells_guard<L: Link, const N: usize>(ctx: &mut Engine<L, N>) -> bool {
    let deadline = ctx.period_us as i64 - ctx.diagnostics.time_to_read_us as i64;
    let elapsed = elapsed_us(ctx.current_time, ctx.last_read) as i64;
    if elapsed >= deadline {
        ctx.driver.wake_up();
        true
    } else {
        false
    }
}

fn standby_to_sleep_guard<L: Link, const N: usize>(ctx: &mut Engine<L, N>) -> bool {
    let elapsed = elapsed_us(ctx.current_time, ctx.sleep_reference) as i64;
    elapsed >= TIME_SLEEP_US
}

fn standby_to_measuring_cells_guard<L: Link, const N: usize>(ctx: &mut Engine<L, N>) -> bool {
    let deadline = ctx.period_us as i64 - ctx.diagnostics.time_to_read_us as i64;
    let elapsed = elapsed_us(ctx.current_time, ctx.last_read) as i64;
    elapsed >= deadline
}

fn measuring_cells_to_reading_cells_guard<L: Link, const N: usize>(
    ctx: &mut Engine<L, N>,
) -> bool {
    ctx.driver.is_conv_done()
}

fn measuring_gpios_to_reading_gpios_guard<L: Link, const N: usize>(
    ctx: &mut Engine<L, N>,
) -> bool {
    ctx.driver.is_conv_done()
}

fn always<L: Link, const N: usize>(_ctx: &mut Engine<L, N>) -> bool {
    true
}

fn build_kernel<L: Link, const N: usize>() -> Kernel<AcqState, Engine<L, N>, 6, 7> {
    Kernel::new(
        AcqState::Sleep,
        [
            sleep_action,
            standby_action,
            measuring_cells_action,
            reading_cells_action,
            measuring_gpios_action,
            reading_gpios_action,
        ],
        [
            Transition::new(AcqState::MeasuringCells, sleep_to_measuring_cells_guard),
            Transition::new(AcqState::Sleep, standby_to_sleep_guard),
            Transition::new(AcqState::MeasuringCells, standby_to_measuring_cells_guard),
            Transition::new(AcqState::ReadingCells, measuring_cells_to_reading_cells_guard),
            Transition::new(AcqState::MeasuringGpios, always),
            Transition::new(AcqState::ReadingGpios, measuring_gpios_to_reading_gpios_guard),
            Transition::new(AcqState::Standby, always),
        ],
        [(0, 1), (1, 2), (3, 1), (4, 1), (5, 1), (6, 1)],
    )
}

/// The acquisition engine: a daisy chain of `N` LTC6810s driven through
/// their sleep/standby/conversion/read cycle.
pub struct Supervisor<L: Link, const N: usize> {
    kernel: Kernel<AcqState, Engine<L, N>, 6, 7>,
    engine: Engine<L, N>,
}

impl<L: Link, const N: usize> Supervisor<L, N> {
    pub fn new(link: L, config: Config) -> Self {
        let window_len = window_len_from(config.window_ms, config.period_us);
        let engine = Engine {
            driver: Driver::new(link, config.refon),
            fronts: [FrontEnd::new(); N],
            diagnostics: Diagnostics::new(window_len),
            current_time: 0,
            sleep_reference: 0,
            last_read: 0,
            init_conv: 0,
            final_conv: 0,
            period_us: config.period_us,
            tick: config.tick,
            tick_resolution_us: config.tick_resolution_us,
        };
        Supervisor {
            kernel: build_kernel(),
            engine,
        }
    }

    /// Refreshes the clock, then steps the state machine once. At most one
    /// transition fires per call.
    pub fn update(&mut self) {
        let raw = (self.engine.tick)();
        self.engine.current_time =
            (raw as u32).wrapping_mul(self.engine.tick_resolution_us);
        self.kernel.step(&mut self.engine);
    }

    pub fn get_data(&self) -> &[FrontEnd; N] {
        &self.engine.fronts
    }

    pub fn get_diag(&self) -> &Diagnostics<N> {
        &self.engine.diagnostics
    }

    pub fn state(&self) -> AcqState {
        self.kernel.current()
    }

    /// Current ADC speed setting, mainly for tests/observability — mirrors
    /// what `faster_conv()` last settled on.
    pub fn adc_mode(&self) -> crate::driver::AdcMode {
        self.engine.driver.mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_us_handles_wraparound() {
        assert_eq!(elapsed_us(5, u32::MAX - 2), 8);
    }

    #[test]
    fn elapsed_us_is_zero_for_equal_timestamps() {
        assert_eq!(elapsed_us(42, 42), 0);
    }
}
