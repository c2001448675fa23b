//! Finite state machine (Mealy machine).

use std::fmt;

/// A component stepped once per tick of its clock domain.
///
/// `tick` computes (1) the current-tick output from the input and the registered state and (2)
/// the next-tick state. Nothing observable changes between ticks.
pub trait Fsm {
    /// Ingress signal, sampled once per tick.
    type I;
    /// Egress signal, produced once per tick.
    type E;

    /// Steps the machine by one tick.
    fn tick(&mut self, input: Self::I) -> Self::E;

    /// Returns every register to its reset value.
    fn reset(&mut self);
}

/// FSM described by a pure transition function, in the style of `fsm_map`.
///
/// The function receives the input and the current state and returns the output together with the
/// next state.
#[derive(Clone)]
pub struct FsmMap<S, I, E> {
    init: S,
    state: S,
    f: fn(I, &S) -> (E, S),
}

impl<S: Clone, I, E> FsmMap<S, I, E> {
    /// Creates a new FSM starting (and resetting) to `init`.
    pub fn new(init: S, f: fn(I, &S) -> (E, S)) -> Self { Self { state: init.clone(), init, f } }

    /// Returns the registered state.
    pub fn state(&self) -> &S { &self.state }
}

impl<S: Clone, I, E> Fsm for FsmMap<S, I, E> {
    type E = E;
    type I = I;

    fn tick(&mut self, input: I) -> E {
        let (output, state_next) = (self.f)(input, &self.state);
        self.state = state_next;
        output
    }

    fn reset(&mut self) { self.state = self.init.clone(); }
}

impl<S: fmt::Debug, I, E> fmt::Debug for FsmMap<S, I, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsmMap").field("init", &self.init).field("state", &self.state).finish()
    }
}
