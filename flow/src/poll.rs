//! Proof polling state machine.
//!
//! Pure transitions: the machine never does I/O and never sleeps. Each
//! [`step`](PollMachine::step) consumes one input and returns the effects
//! the driver must perform, which makes every timing and counting rule
//! unit-testable without a runtime.
//!
//! Timeouts are attempt-count-based, not wall-clock-based: exactly
//! `max_poll_attempts` lookups come back empty before the machine parks in
//! `TimedOut` and waits for the user to resume or abandon.

use creditline_types::FlowParams;
use creditline_webproof::ProofPayload;

/// The polling loop's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollState {
    /// Not started.
    Idle,
    /// Lookups are being issued.
    Polling,
    /// A proof arrived.
    Succeeded,
    /// Attempt budget exhausted; waiting for resume-or-abandon.
    TimedOut,
    /// Stopped by the user.
    Cancelled,
}

/// One input to the machine.
#[derive(Clone, Debug, PartialEq)]
pub enum PollInput {
    /// Begin polling.
    Start,
    /// A lookup returned a proof.
    Ready(ProofPayload),
    /// A lookup returned empty / not-ready.
    NotReady,
    /// A lookup failed in transport. Deliberately treated exactly like
    /// `NotReady`: proof generation latency is provider-controlled and
    /// unbounded, so the loop keeps best-effort retrying inside the same
    /// attempt budget.
    TransportError,
    /// User chose to keep waiting after a timeout.
    Resume,
    /// User chose to give up after a timeout.
    Abandon,
    /// Cooperative cancellation. The driver feeds this only at a poll
    /// boundary, never while a lookup is in flight.
    Cancel,
}

/// What the driver must do after a transition.
#[derive(Clone, Debug, PartialEq)]
pub enum PollEffect {
    /// Issue the next lookup after the given delay.
    ScheduleLookup { delay_secs: u64 },
    /// Hand the retrieved proof to the caller.
    DeliverProof(ProofPayload),
    /// Tell the caller the attempt budget ran out (they choose resume or
    /// abandon).
    AnnounceTimeout,
    /// The loop is over with no proof.
    Stopped,
}

/// The polling state machine.
///
/// Constructed per verification attempt and passed to the driver; no
/// global polling service exists.
#[derive(Clone, Debug)]
pub struct PollMachine {
    state: PollState,
    attempts: u32,
    max_attempts: u32,
    interval_secs: u64,
}

impl PollMachine {
    pub fn new(params: &FlowParams) -> Self {
        Self {
            state: PollState::Idle,
            attempts: 0,
            max_attempts: params.max_poll_attempts,
            interval_secs: params.poll_interval_secs,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Lookups issued so far in the current round.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Advance the machine by one input.
    ///
    /// Inputs that make no sense in the current state are ignored and
    /// produce no effects.
    pub fn step(&mut self, input: PollInput) -> Vec<PollEffect> {
        match (self.state, input) {
            (PollState::Idle, PollInput::Start) => {
                self.state = PollState::Polling;
                self.attempts = 0;
                vec![PollEffect::ScheduleLookup { delay_secs: 0 }]
            }

            (PollState::Polling, PollInput::Ready(payload)) => {
                self.attempts += 1;
                self.state = PollState::Succeeded;
                vec![PollEffect::DeliverProof(payload)]
            }

            (PollState::Polling, PollInput::NotReady | PollInput::TransportError) => {
                self.attempts += 1;
                if self.attempts >= self.max_attempts {
                    self.state = PollState::TimedOut;
                    vec![PollEffect::AnnounceTimeout]
                } else {
                    vec![PollEffect::ScheduleLookup {
                        delay_secs: self.interval_secs,
                    }]
                }
            }

            (PollState::TimedOut, PollInput::Resume) => {
                self.state = PollState::Polling;
                self.attempts = 0;
                vec![PollEffect::ScheduleLookup { delay_secs: 0 }]
            }

            (PollState::TimedOut, PollInput::Abandon) => {
                self.state = PollState::Cancelled;
                vec![PollEffect::Stopped]
            }

            (PollState::Idle | PollState::Polling | PollState::TimedOut, PollInput::Cancel) => {
                self.state = PollState::Cancelled;
                vec![PollEffect::Stopped]
            }

            // Terminal states and mismatched inputs: no transition.
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> PollMachine {
        PollMachine::new(&FlowParams::defaults())
    }

    fn payload() -> ProofPayload {
        serde_json::from_str(r#"{"balance": 15000}"#).unwrap()
    }

    /// Drive one not-ready lookup cycle, asserting the machine asked for
    /// another lookup.
    fn feed_not_ready(m: &mut PollMachine) -> Vec<PollEffect> {
        m.step(PollInput::NotReady)
    }

    // ── Start ───────────────────────────────────────────────────────────

    #[test]
    fn start_schedules_immediate_lookup() {
        let mut m = machine();
        let effects = m.step(PollInput::Start);
        assert_eq!(effects, vec![PollEffect::ScheduleLookup { delay_secs: 0 }]);
        assert_eq!(m.state(), PollState::Polling);
        assert_eq!(m.attempts(), 0);
    }

    #[test]
    fn start_twice_is_ignored() {
        let mut m = machine();
        m.step(PollInput::Start);
        assert!(m.step(PollInput::Start).is_empty());
        assert_eq!(m.state(), PollState::Polling);
    }

    // ── Attempt counting ────────────────────────────────────────────────

    #[test]
    fn times_out_after_exactly_twenty_attempts() {
        let mut m = machine();
        m.step(PollInput::Start);

        // Attempts 1..=19 keep scheduling the next lookup.
        for attempt in 1..20 {
            let effects = feed_not_ready(&mut m);
            assert_eq!(
                effects,
                vec![PollEffect::ScheduleLookup { delay_secs: 3 }],
                "attempt {attempt} should schedule another lookup"
            );
            assert_eq!(m.attempts(), attempt);
            assert_eq!(m.state(), PollState::Polling);
        }

        // Attempt 20 trips the budget. Never 19, never 21.
        let effects = feed_not_ready(&mut m);
        assert_eq!(effects, vec![PollEffect::AnnounceTimeout]);
        assert_eq!(m.attempts(), 20);
        assert_eq!(m.state(), PollState::TimedOut);
    }

    #[test]
    fn succeeds_on_the_attempt_the_proof_arrives() {
        let mut m = machine();
        m.step(PollInput::Start);

        for _ in 1..5 {
            feed_not_ready(&mut m);
        }
        assert_eq!(m.attempts(), 4);

        let effects = m.step(PollInput::Ready(payload()));
        assert_eq!(m.attempts(), 5);
        assert_eq!(m.state(), PollState::Succeeded);
        assert_eq!(effects, vec![PollEffect::DeliverProof(payload())]);
    }

    #[test]
    fn transport_error_counts_like_not_ready_and_polling_continues() {
        let mut m = machine();
        m.step(PollInput::Start);

        feed_not_ready(&mut m);
        feed_not_ready(&mut m);

        // Transport failure on attempt 3: not a failure state, loop goes on.
        let effects = m.step(PollInput::TransportError);
        assert_eq!(effects, vec![PollEffect::ScheduleLookup { delay_secs: 3 }]);
        assert_eq!(m.attempts(), 3);
        assert_eq!(m.state(), PollState::Polling);

        // Attempt 4 proceeds normally.
        let effects = feed_not_ready(&mut m);
        assert_eq!(effects, vec![PollEffect::ScheduleLookup { delay_secs: 3 }]);
        assert_eq!(m.attempts(), 4);
    }

    #[test]
    fn inter_poll_delay_is_three_seconds() {
        let mut m = machine();
        m.step(PollInput::Start);
        let effects = feed_not_ready(&mut m);
        assert_eq!(effects, vec![PollEffect::ScheduleLookup { delay_secs: 3 }]);
    }

    // ── Timeout choices ─────────────────────────────────────────────────

    fn timed_out_machine() -> PollMachine {
        let mut m = machine();
        m.step(PollInput::Start);
        for _ in 0..20 {
            m.step(PollInput::NotReady);
        }
        assert_eq!(m.state(), PollState::TimedOut);
        m
    }

    #[test]
    fn resume_resets_the_attempt_counter() {
        let mut m = timed_out_machine();
        let effects = m.step(PollInput::Resume);
        assert_eq!(effects, vec![PollEffect::ScheduleLookup { delay_secs: 0 }]);
        assert_eq!(m.state(), PollState::Polling);
        assert_eq!(m.attempts(), 0);

        // A full fresh budget is available after resuming.
        for _ in 0..19 {
            m.step(PollInput::NotReady);
        }
        assert_eq!(m.state(), PollState::Polling);
        let effects = m.step(PollInput::NotReady);
        assert_eq!(effects, vec![PollEffect::AnnounceTimeout]);
    }

    #[test]
    fn abandon_cancels() {
        let mut m = timed_out_machine();
        let effects = m.step(PollInput::Abandon);
        assert_eq!(effects, vec![PollEffect::Stopped]);
        assert_eq!(m.state(), PollState::Cancelled);
    }

    // ── Cancellation ────────────────────────────────────────────────────

    #[test]
    fn cancel_at_poll_boundary_stops_the_loop() {
        let mut m = machine();
        m.step(PollInput::Start);
        feed_not_ready(&mut m);

        let effects = m.step(PollInput::Cancel);
        assert_eq!(effects, vec![PollEffect::Stopped]);
        assert_eq!(m.state(), PollState::Cancelled);
    }

    #[test]
    fn cancel_while_timed_out_stops_the_loop() {
        let mut m = timed_out_machine();
        let effects = m.step(PollInput::Cancel);
        assert_eq!(effects, vec![PollEffect::Stopped]);
        assert_eq!(m.state(), PollState::Cancelled);
    }

    // ── Terminal states ─────────────────────────────────────────────────

    #[test]
    fn succeeded_ignores_further_inputs() {
        let mut m = machine();
        m.step(PollInput::Start);
        m.step(PollInput::Ready(payload()));
        assert_eq!(m.state(), PollState::Succeeded);

        for input in [PollInput::NotReady, PollInput::Cancel, PollInput::Resume] {
            assert!(m.step(input).is_empty());
            assert_eq!(m.state(), PollState::Succeeded);
        }
    }

    #[test]
    fn cancelled_ignores_further_inputs() {
        let mut m = machine();
        m.step(PollInput::Start);
        m.step(PollInput::Cancel);

        for input in [PollInput::Start, PollInput::NotReady, PollInput::Resume] {
            assert!(m.step(input).is_empty());
            assert_eq!(m.state(), PollState::Cancelled);
        }
    }

    #[test]
    fn ready_in_idle_is_ignored() {
        let mut m = machine();
        assert!(m.step(PollInput::Ready(payload())).is_empty());
        assert_eq!(m.state(), PollState::Idle);
    }
}
