//! A generic, fixed-capacity state/transition table.
//!
//! This is deliberately domain-free: nothing here knows about batteries,
//! SPI, or timestamps. [`crate::supervisor`] is the one consumer that wires
//! it to the acquisition protocol; another caller with a different context
//! type and state enum could reuse it unchanged.
//!
//! Actions and guards are plain function pointers over a caller-supplied
//! context `C`, not closures — the table stays a flat, `'static`,
//! zero-allocation value with an observable, declaration-order priority for
//! guard evaluation, the same shape as a build-time `constexpr` table.

/// Maps a state enum onto a dense `0..COUNT` index space so it can address
/// fixed-size arrays.
pub trait StateIndex: Copy + Eq {
    /// Number of distinct states.
    const COUNT: usize;
    /// This state's index in `0..COUNT`.
    fn index(&self) -> usize;
}

type Action<C> = fn(&mut C);
type Guard<C> = fn(&mut C) -> bool;

/// One outgoing edge: fire into `target` when `guard` returns true.
#[derive(Clone, Copy)]
pub struct Transition<S, C> {
    pub target: S,
    pub guard: Guard<C>,
}

impl<S: Copy, C> Transition<S, C> {
    pub const fn new(target: S, guard: Guard<C>) -> Self {
        Transition { target, guard }
    }
}

/// A fixed-capacity state/transition table over state enum `S` (with
/// `S::COUNT == NSTATES`), context `C`, and a flat transition array of
/// total length `NTRANS`.
pub struct Kernel<S: StateIndex, C, const NSTATES: usize, const NTRANS: usize> {
    current: S,
    actions: [Action<C>; NSTATES],
    transitions: [Transition<S, C>; NTRANS],
    /// Per-state (offset, count) slice into `transitions`, indexed by
    /// `StateIndex::index`.
    ranges: [(usize, usize); NSTATES],
}

impl<S: StateIndex, C, const NSTATES: usize, const NTRANS: usize> Kernel<S, C, NSTATES, NTRANS> {
    /// Builds a kernel from a flat transition array and the (offset, count)
    /// ranges that slice it per state. Callers assemble `ranges` and
    /// `transitions` so that each state's transitions are contiguous and
    /// in priority order — see [`crate::supervisor`] for the canonical
    /// example.
    pub const fn new(
        initial: S,
        actions: [Action<C>; NSTATES],
        transitions: [Transition<S, C>; NTRANS],
        ranges: [(usize, usize); NSTATES],
    ) -> Self {
        Kernel {
            current: initial,
            actions,
            transitions,
            ranges,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    /// Evaluates the current state's outgoing transitions in declared
    /// order. The first guard to return true fires: the state changes and
    /// the target's entry action runs, then evaluation stops. If no guard
    /// fires, nothing happens (the current state's action is not
    /// re-invoked).
    pub fn step(&mut self, ctx: &mut C) {
        let (offset, count) = self.ranges[self.current.index()];
        for transition in &self.transitions[offset..offset + count] {
            if (transition.guard)(ctx) {
                self.current = transition.target;
                (self.actions[self.current.index()])(ctx);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    enum Toy {
        A,
        B,
    }

    impl StateIndex for Toy {
        const COUNT: usize = 2;
        fn index(&self) -> usize {
            *self as usize
        }
    }

    struct Ctx {
        entered_b: u32,
        allow: bool,
    }

    fn noop(_: &mut Ctx) {}
    fn enter_b(ctx: &mut Ctx) {
        ctx.entered_b += 1;
    }
    fn allow_guard(ctx: &mut Ctx) -> bool {
        ctx.allow
    }
    fn never(_: &mut Ctx) -> bool {
        false
    }

    #[test]
    fn first_true_guard_wins_and_action_fires_once() {
        let mut kernel: Kernel<Toy, Ctx, 2, 2> = Kernel::new(
            Toy::A,
            [noop, enter_b],
            [
                Transition::new(Toy::B, allow_guard),
                Transition::new(Toy::A, never),
            ],
            [(0, 1), (1, 1)],
        );
        let mut ctx = Ctx {
            entered_b: 0,
            allow: false,
        };
        kernel.step(&mut ctx);
        assert_eq!(kernel.current(), Toy::A);
        assert_eq!(ctx.entered_b, 0);

        ctx.allow = true;
        kernel.step(&mut ctx);
        assert_eq!(kernel.current(), Toy::B);
        assert_eq!(ctx.entered_b, 1);
    }

    #[test]
    fn no_firing_guard_does_not_rerun_entry_action() {
        let mut kernel: Kernel<Toy, Ctx, 2, 2> = Kernel::new(
            Toy::B,
            [noop, enter_b],
            [
                Transition::new(Toy::B, allow_guard),
                Transition::new(Toy::A, never),
            ],
            [(0, 1), (1, 1)],
        );
        let mut ctx = Ctx {
            entered_b: 0,
            allow: false,
        };
        kernel.step(&mut ctx);
        kernel.step(&mut ctx);
        assert_eq!(ctx.entered_b, 0);
    }
}
