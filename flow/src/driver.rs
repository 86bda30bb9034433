//! Async interpreter for the polling state machine.
//!
//! Each scheduled poll is a discrete deferred task (`tokio::time::sleep`),
//! not a long-lived blocking wait, so the host stays responsive between
//! polls. Cancellation is advisory: the flag is read at poll boundaries
//! only, and an in-flight lookup always runs to completion.

use crate::poll::{PollEffect, PollInput, PollMachine, PollState};
use creditline_types::{FlowParams, RequestId};
use creditline_webproof::{ProofPayload, ProofSource};

use std::time::Duration;
use tokio::sync::watch;

/// How one polling round resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    /// The proof arrived.
    Proof(ProofPayload),
    /// The attempt budget ran out. The machine is parked in `TimedOut`;
    /// the caller chooses to resume (another full budget) or abandon.
    TimedOut,
    /// The loop was cancelled or abandoned.
    Cancelled,
}

/// Drives a [`PollMachine`] against a real proof source.
pub struct PollDriver<'a, S: ProofSource> {
    machine: &'a mut PollMachine,
    source: &'a S,
    request_id: &'a RequestId,
    cancel: watch::Receiver<bool>,
}

impl<'a, S: ProofSource> PollDriver<'a, S> {
    pub fn new(
        machine: &'a mut PollMachine,
        source: &'a S,
        request_id: &'a RequestId,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            machine,
            source,
            request_id,
            cancel,
        }
    }

    /// Start polling from idle and run until the round resolves.
    pub async fn run(&mut self) -> PollOutcome {
        let effects = self.machine.step(PollInput::Start);
        self.interpret(effects).await
    }

    /// Continue a timed-out round with a fresh attempt budget.
    pub async fn resume(&mut self) -> PollOutcome {
        let effects = self.machine.step(PollInput::Resume);
        self.interpret(effects).await
    }

    async fn interpret(&mut self, mut effects: Vec<PollEffect>) -> PollOutcome {
        loop {
            let Some(effect) = effects.pop() else {
                // The machine had nothing to do; it was already resolved.
                return match self.machine.state() {
                    PollState::TimedOut => PollOutcome::TimedOut,
                    _ => PollOutcome::Cancelled,
                };
            };

            match effect {
                PollEffect::ScheduleLookup { delay_secs } => {
                    if delay_secs > 0 {
                        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                    }

                    // Poll boundary: the only place cancellation is honored.
                    if *self.cancel.borrow() {
                        effects = self.machine.step(PollInput::Cancel);
                        continue;
                    }

                    let attempt = self.machine.attempts() + 1;
                    tracing::debug!(
                        request_id = %self.request_id,
                        attempt,
                        "looking up proof"
                    );

                    let input = match self.source.fetch_proof(self.request_id).await {
                        Ok(Some(payload)) => PollInput::Ready(payload),
                        Ok(None) => PollInput::NotReady,
                        Err(e) => {
                            // Transient by policy: absorbed into the shared
                            // attempt budget, never surfaced individually.
                            tracing::warn!(
                                request_id = %self.request_id,
                                attempt,
                                error = %e,
                                "proof lookup failed, continuing"
                            );
                            PollInput::TransportError
                        }
                    };
                    effects = self.machine.step(input);
                }

                PollEffect::DeliverProof(payload) => return PollOutcome::Proof(payload),
                PollEffect::AnnounceTimeout => return PollOutcome::TimedOut,
                PollEffect::Stopped => return PollOutcome::Cancelled,
            }
        }
    }
}
