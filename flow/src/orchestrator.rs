//! End-to-end verification flow engine.
//!
//! Wires builder → dispatcher → polling loop → extractor → submission and
//! tracks the single active [`VerificationRequest`]. The engine is
//! explicitly constructed with its collaborators and holds no process-wide
//! state; hosts render progress by draining [`FlowEvent`]s.

use crate::driver::{PollDriver, PollOutcome};
use crate::error::FlowError;
use crate::poll::{PollInput, PollMachine, PollState};

use creditline_chain::{submit_and_confirm, ChainGateway, SubmissionReceipt};
use creditline_dispatch::RedirectDispatcher;
use creditline_types::{
    ChainAddress, FlowParams, Provider, RequestId, RequestStatus, Timestamp, VerificationRequest,
};
use creditline_webproof::{
    extract, parse_return_params, ProofPayload, ProofSource, RequestBuilder,
};

use tokio::sync::watch;

/// Events emitted by the engine for the host to render.
#[derive(Clone, Debug, PartialEq)]
pub enum FlowEvent {
    RequestCreated {
        id: RequestId,
        provider: Provider,
    },
    RedirectLaunched {
        id: RequestId,
        strategy: &'static str,
    },
    PollingStarted {
        id: RequestId,
    },
    ProofReceived {
        id: RequestId,
    },
    /// The poll budget ran out; the user decides whether to keep waiting.
    TimedOut {
        id: RequestId,
        attempts: u32,
    },
    PollingResumed {
        id: RequestId,
    },
    Cancelled {
        id: RequestId,
    },
    Submitted {
        id: RequestId,
        tx_hash: String,
    },
    Confirmed {
        id: RequestId,
        tx_hash: String,
    },
    Failed {
        id: RequestId,
        reason: String,
    },
}

/// Cancels a running flow cooperatively from outside the engine borrow.
#[derive(Clone)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    /// Flag the flow for cancellation at its next poll boundary.
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

/// The verification flow engine.
///
/// One engine drives one verification attempt at a time; collaborators are
/// injected at construction.
pub struct FlowEngine<S: ProofSource, G: ChainGateway> {
    builder: RequestBuilder,
    dispatcher: RedirectDispatcher,
    source: S,
    gateway: G,
    params: FlowParams,

    request: Option<VerificationRequest>,
    verification_url: Option<String>,
    machine: PollMachine,
    proof: Option<ProofPayload>,
    cancel_tx: watch::Sender<bool>,
    pending_events: Vec<FlowEvent>,
}

impl<S: ProofSource, G: ChainGateway + Sync> FlowEngine<S, G> {
    pub fn new(
        builder: RequestBuilder,
        dispatcher: RedirectDispatcher,
        source: S,
        gateway: G,
        params: FlowParams,
    ) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        let machine = PollMachine::new(&params);
        Self {
            builder,
            dispatcher,
            source,
            gateway,
            params,
            request: None,
            verification_url: None,
            machine,
            proof: None,
            cancel_tx,
            pending_events: Vec::new(),
        }
    }

    /// The active request, if any.
    pub fn request(&self) -> Option<&VerificationRequest> {
        self.request.as_ref()
    }

    /// Status of the active request.
    pub fn status(&self) -> Option<RequestStatus> {
        self.request.as_ref().map(|r| r.status)
    }

    /// The verification URL of the active request (for hosts that display
    /// it alongside launching it).
    pub fn verification_url(&self) -> Option<&str> {
        self.verification_url.as_deref()
    }

    /// Drain buffered events for the host to render.
    pub fn drain_events(&mut self) -> Vec<FlowEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Request cooperative cancellation. Takes effect at the next poll
    /// boundary; an in-flight lookup is never pre-empted.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// A handle that can cancel the flow from another task (e.g. a signal
    /// handler) while the engine itself is borrowed by `poll`.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel_tx.clone())
    }

    // ── Step 1 + 2: build and launch ────────────────────────────────────

    /// Build a verification request and launch the provider redirect.
    ///
    /// On a launch failure the request stays in `Created` and this can be
    /// retried with [`retry_redirect`](Self::retry_redirect); a
    /// configuration error is fatal and leaves no active request.
    pub fn start(
        &mut self,
        provider: Provider,
        currency: Option<&str>,
    ) -> Result<&RequestId, FlowError> {
        let started = self.builder.start(provider, currency)?;

        let request = VerificationRequest {
            id: started.request_id.clone(),
            provider,
            created_at: Timestamp::now(),
            status: RequestStatus::Created,
        };
        self.pending_events.push(FlowEvent::RequestCreated {
            id: request.id.clone(),
            provider,
        });
        self.verification_url = Some(started.verification_url);
        self.request = Some(request);

        self.launch_redirect()?;
        Ok(&self.request.as_ref().expect("request just set").id)
    }

    /// Retry the redirect launch for a request still in `Created`.
    pub fn retry_redirect(&mut self) -> Result<(), FlowError> {
        match self.status() {
            Some(RequestStatus::Created) => self.launch_redirect(),
            other => Err(FlowError::InvalidState {
                operation: "retry the redirect",
                actual: format!("{other:?}"),
            }),
        }
    }

    fn launch_redirect(&mut self) -> Result<(), FlowError> {
        let url = self
            .verification_url
            .clone()
            .expect("launch_redirect requires a built url");

        let strategy = self.dispatcher.dispatch(&url)?;

        let request = self.request.as_mut().expect("active request");
        request.status = RequestStatus::AwaitingRedirectCompletion;
        self.pending_events.push(FlowEvent::RedirectLaunched {
            id: request.id.clone(),
            strategy,
        });
        Ok(())
    }

    /// Adopt a request arriving back from the provider redirect
    /// (`vouch=<tag>&requestId=<id>`), replacing any active request.
    pub fn resume_from_return(&mut self, query: &str) -> Result<&RequestId, FlowError> {
        let (provider, id) = parse_return_params(query).ok_or_else(|| {
            FlowError::Configuration(format!("unrecognized return parameters: {query}"))
        })?;

        let request = VerificationRequest::resumed(id, provider, Timestamp::now());
        self.machine = PollMachine::new(&self.params);
        self.proof = None;
        self.pending_events.push(FlowEvent::RequestCreated {
            id: request.id.clone(),
            provider,
        });
        self.request = Some(request);
        Ok(&self.request.as_ref().expect("request just set").id)
    }

    // ── Step 3: poll ────────────────────────────────────────────────────

    /// Poll the provider until the round resolves.
    ///
    /// `TimedOut` parks the request; call [`resume_polling`](Self::resume_polling)
    /// or [`abandon`](Self::abandon) to continue.
    pub async fn poll(&mut self) -> Result<PollOutcome, FlowError> {
        if self.machine.state() != PollState::Idle {
            return Err(FlowError::InvalidState {
                operation: "start polling",
                actual: format!("{:?}", self.machine.state()),
            });
        }
        let request = self.request.as_mut().ok_or(FlowError::InvalidState {
            operation: "poll for a proof",
            actual: "no active request".into(),
        })?;

        request.status = RequestStatus::Polling;
        let id = request.id.clone();
        self.pending_events
            .push(FlowEvent::PollingStarted { id: id.clone() });

        let outcome = {
            let mut driver = PollDriver::new(
                &mut self.machine,
                &self.source,
                &id,
                self.cancel_tx.subscribe(),
            );
            driver.run().await
        };
        self.absorb_outcome(outcome)
    }

    /// Keep waiting after a timeout: a fresh attempt budget, same request.
    pub async fn resume_polling(&mut self) -> Result<PollOutcome, FlowError> {
        if self.machine.state() != PollState::TimedOut {
            return Err(FlowError::InvalidState {
                operation: "resume polling",
                actual: format!("{:?}", self.machine.state()),
            });
        }
        let request = self.request.as_mut().expect("timed-out request exists");
        request.status = RequestStatus::Polling;
        let id = request.id.clone();
        self.pending_events
            .push(FlowEvent::PollingResumed { id: id.clone() });

        let outcome = {
            let mut driver = PollDriver::new(
                &mut self.machine,
                &self.source,
                &id,
                self.cancel_tx.subscribe(),
            );
            driver.resume().await
        };
        self.absorb_outcome(outcome)
    }

    /// Give up after a timeout.
    pub fn abandon(&mut self) -> Result<(), FlowError> {
        if self.machine.state() != PollState::TimedOut {
            return Err(FlowError::InvalidState {
                operation: "abandon the request",
                actual: format!("{:?}", self.machine.state()),
            });
        }
        self.machine.step(PollInput::Abandon);
        let request = self.request.as_mut().expect("timed-out request exists");
        request.status = RequestStatus::Cancelled;
        self.pending_events.push(FlowEvent::Cancelled {
            id: request.id.clone(),
        });
        Ok(())
    }

    fn absorb_outcome(&mut self, outcome: PollOutcome) -> Result<PollOutcome, FlowError> {
        let request = self.request.as_mut().expect("active request");
        match &outcome {
            PollOutcome::Proof(payload) => {
                self.proof = Some(payload.clone());
                self.pending_events.push(FlowEvent::ProofReceived {
                    id: request.id.clone(),
                });
            }
            PollOutcome::TimedOut => {
                request.status = RequestStatus::TimedOut;
                self.pending_events.push(FlowEvent::TimedOut {
                    id: request.id.clone(),
                    attempts: self.machine.attempts(),
                });
            }
            PollOutcome::Cancelled => {
                request.status = RequestStatus::Cancelled;
                self.pending_events.push(FlowEvent::Cancelled {
                    id: request.id.clone(),
                });
            }
        }
        Ok(outcome)
    }

    // ── Step 4 + 5: extract and submit ──────────────────────────────────

    /// Extract the income bucket from the retrieved proof and submit the
    /// commitment on-chain. Succeeds the request once the transaction is
    /// confirmed; any submission failure is fatal to the attempt and
    /// surfaced verbatim, with no automatic retry.
    pub async fn complete(
        &mut self,
        wallet: &ChainAddress,
    ) -> Result<SubmissionReceipt, FlowError> {
        let proof = self.proof.as_ref().ok_or(FlowError::InvalidState {
            operation: "submit the commitment",
            actual: "no proof retrieved".into(),
        })?;
        let request = self.request.as_mut().expect("request exists when proof does");
        let provider = request.provider;
        let id = request.id.clone();

        let estimate = extract::estimate_income(proof, provider, &self.params);
        if estimate.missing_field {
            // Deliberate degrade-to-zero; worth a trace for operators.
            tracing::warn!(
                request_id = %id,
                %provider,
                "proof payload had no numeric field, income treated as zero"
            );
        }
        let bucket = extract::income_bucket(proof, provider, &self.params);
        let proof_hash = proof.content_hash();

        tracing::info!(
            request_id = %id,
            bucket = %bucket,
            proof_hash = %proof_hash,
            "submitting income commitment"
        );

        match submit_and_confirm(&self.gateway, &self.params, wallet, bucket, &proof_hash).await
        {
            Ok(receipt) => {
                request.status = RequestStatus::Succeeded;
                self.pending_events.push(FlowEvent::Submitted {
                    id: id.clone(),
                    tx_hash: receipt.transaction_hash.clone(),
                });
                self.pending_events.push(FlowEvent::Confirmed {
                    id,
                    tx_hash: receipt.transaction_hash.clone(),
                });
                Ok(receipt)
            }
            Err(e) => {
                request.status = RequestStatus::Failed;
                self.pending_events.push(FlowEvent::Failed {
                    id,
                    reason: e.to_string(),
                });
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creditline_chain::ChainError;
    use creditline_dispatch::{strategy_fn, DispatchError, LaunchOutcome};
    use creditline_types::{IncomeBucket, ProofHash};
    use creditline_webproof::{BuilderConfig, WebProofError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    // ── Test doubles ────────────────────────────────────────────────────

    struct ScriptedSource {
        script: Mutex<Vec<Result<Option<ProofPayload>, WebProofError>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Option<ProofPayload>, WebProofError>>) -> Self {
            Self {
                script: Mutex::new(script),
            }
        }

        fn ready_on(attempt: usize, payload: ProofPayload) -> Self {
            let mut script: Vec<Result<Option<ProofPayload>, WebProofError>> =
                (1..attempt).map(|_| Ok(None)).collect();
            script.push(Ok(Some(payload)));
            Self::new(script)
        }

        fn never_ready() -> Self {
            Self::new(Vec::new())
        }
    }

    impl ProofSource for ScriptedSource {
        async fn fetch_proof(
            &self,
            _id: &RequestId,
        ) -> Result<Option<ProofPayload>, WebProofError> {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                Ok(None)
            } else {
                script.remove(0)
            }
        }
    }

    struct RecordingGateway {
        submitted_buckets: Mutex<Vec<u64>>,
        submits: AtomicU32,
        reject: bool,
    }

    impl RecordingGateway {
        fn accepting() -> Self {
            Self {
                submitted_buckets: Mutex::new(Vec::new()),
                submits: AtomicU32::new(0),
                reject: false,
            }
        }

        fn rejecting() -> Self {
            Self {
                submitted_buckets: Mutex::new(Vec::new()),
                submits: AtomicU32::new(0),
                reject: true,
            }
        }
    }

    impl ChainGateway for RecordingGateway {
        async fn submit_income_proof(
            &self,
            _user: &ChainAddress,
            bucket: IncomeBucket,
            proof_hash: &ProofHash,
        ) -> Result<String, ChainError> {
            assert!(!proof_hash.is_zero());
            self.submits.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(ChainError::Rejected("gas estimation failed".into()));
            }
            self.submitted_buckets.lock().unwrap().push(bucket.as_units());
            Ok("0xfeed".to_string())
        }

        async fn transaction_confirmed(&self, _tx_hash: &str) -> Result<bool, ChainError> {
            Ok(true)
        }
    }

    fn engine_with(
        source: ScriptedSource,
        gateway: RecordingGateway,
    ) -> FlowEngine<ScriptedSource, RecordingGateway> {
        let builder = RequestBuilder::new(BuilderConfig::new(
            "customer-1",
            "http://localhost:8081",
        ));
        let dispatcher = RedirectDispatcher::new(vec![Box::new(strategy_fn(
            "test-window",
            |_| Ok(LaunchOutcome::Opened),
        ))]);
        let params = FlowParams {
            confirmation_poll_interval_secs: 0,
            ..FlowParams::defaults()
        };
        FlowEngine::new(builder, dispatcher, source, gateway, params)
    }

    fn wallet() -> ChainAddress {
        ChainAddress::parse(format!("0x{}", "22".repeat(20))).unwrap()
    }

    fn balance_payload() -> ProofPayload {
        serde_json::from_str(r#"{"balance": 15000}"#).unwrap()
    }

    // ── Full flow ───────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn full_flow_succeeds_end_to_end() {
        let mut engine = engine_with(
            ScriptedSource::ready_on(5, balance_payload()),
            RecordingGateway::accepting(),
        );

        engine.start(Provider::Binance, Some("USDT")).unwrap();
        assert_eq!(
            engine.status(),
            Some(RequestStatus::AwaitingRedirectCompletion)
        );

        let outcome = engine.poll().await.unwrap();
        assert!(matches!(outcome, PollOutcome::Proof(_)));

        let receipt = engine.complete(&wallet()).await.unwrap();
        assert!(receipt.confirmed);
        assert_eq!(engine.status(), Some(RequestStatus::Succeeded));

        // balance 15000 -> estimate 1500 -> bucket 1000
        assert_eq!(
            *engine.gateway.submitted_buckets.lock().unwrap(),
            vec![1000]
        );

        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, FlowEvent::RequestCreated { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, FlowEvent::RedirectLaunched { strategy: "test-window", .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, FlowEvent::ProofReceived { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, FlowEvent::Confirmed { tx_hash, .. } if tx_hash == "0xfeed")));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_payload_submits_zero_bucket() {
        let empty: ProofPayload = serde_json::from_str("{}").unwrap();
        let mut engine = engine_with(
            ScriptedSource::ready_on(1, empty),
            RecordingGateway::accepting(),
        );

        engine.start(Provider::Wise, None).unwrap();
        engine.poll().await.unwrap();
        let receipt = engine.complete(&wallet()).await.unwrap();

        assert!(receipt.confirmed);
        assert_eq!(*engine.gateway.submitted_buckets.lock().unwrap(), vec![0]);
    }

    // ── Configuration and redirect failures ─────────────────────────────

    #[tokio::test]
    async fn missing_customer_id_is_fatal_configuration_error() {
        let builder = RequestBuilder::new(BuilderConfig::new("", "http://localhost:8081"));
        let dispatcher = RedirectDispatcher::new(vec![Box::new(strategy_fn(
            "test-window",
            |_| Ok(LaunchOutcome::Opened),
        ))]);
        let mut engine = FlowEngine::new(
            builder,
            dispatcher,
            ScriptedSource::never_ready(),
            RecordingGateway::accepting(),
            FlowParams::defaults(),
        );

        let result = engine.start(Provider::Wise, None);
        assert!(matches!(result, Err(FlowError::Configuration(_))));
        assert!(engine.request().is_none());
    }

    #[tokio::test]
    async fn failed_redirect_keeps_request_created_and_retryable() {
        let builder = RequestBuilder::new(BuilderConfig::new(
            "customer-1",
            "http://localhost:8081",
        ));
        let blocked_then_open = {
            let calls = AtomicU32::new(0);
            strategy_fn("flaky-window", move |_| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(DispatchError::LaunchFailed {
                        strategy: "flaky-window",
                        reason: "no display".into(),
                    })
                } else {
                    Ok(LaunchOutcome::Opened)
                }
            })
        };
        let dispatcher = RedirectDispatcher::new(vec![Box::new(blocked_then_open)]);
        let mut engine = FlowEngine::new(
            builder,
            dispatcher,
            ScriptedSource::never_ready(),
            RecordingGateway::accepting(),
            FlowParams::defaults(),
        );

        let result = engine.start(Provider::Wise, None);
        assert!(matches!(result, Err(FlowError::Redirect(_))));
        assert_eq!(engine.status(), Some(RequestStatus::Created));

        // The caller may retry; the second launch succeeds.
        engine.retry_redirect().unwrap();
        assert_eq!(
            engine.status(),
            Some(RequestStatus::AwaitingRedirectCompletion)
        );
    }

    // ── Timeout, resume, abandon ────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn timeout_then_resume_then_success() {
        // Not ready for the whole first budget, ready on the 3rd lookup of
        // the second round.
        let mut script: Vec<Result<Option<ProofPayload>, WebProofError>> =
            (0..22).map(|_| Ok(None)).collect();
        script.push(Ok(Some(balance_payload())));
        let mut engine = engine_with(
            ScriptedSource::new(script),
            RecordingGateway::accepting(),
        );

        engine.start(Provider::Binance, Some("USDT")).unwrap();
        let outcome = engine.poll().await.unwrap();
        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(engine.status(), Some(RequestStatus::TimedOut));

        let outcome = engine.resume_polling().await.unwrap();
        assert!(matches!(outcome, PollOutcome::Proof(_)));
        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, FlowEvent::TimedOut { attempts: 20, .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, FlowEvent::PollingResumed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_then_abandon_cancels_the_request() {
        let mut engine = engine_with(
            ScriptedSource::never_ready(),
            RecordingGateway::accepting(),
        );

        engine.start(Provider::Wise, None).unwrap();
        assert_eq!(engine.poll().await.unwrap(), PollOutcome::TimedOut);

        engine.abandon().unwrap();
        assert_eq!(engine.status(), Some(RequestStatus::Cancelled));
    }

    #[tokio::test]
    async fn abandon_outside_timeout_is_invalid() {
        let mut engine = engine_with(
            ScriptedSource::never_ready(),
            RecordingGateway::accepting(),
        );
        engine.start(Provider::Wise, None).unwrap();
        assert!(matches!(
            engine.abandon(),
            Err(FlowError::InvalidState { .. })
        ));
    }

    // ── Cancellation ────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn cancel_before_polling_resolves_cancelled() {
        let mut engine = engine_with(
            ScriptedSource::never_ready(),
            RecordingGateway::accepting(),
        );

        engine.start(Provider::Wise, None).unwrap();
        engine.cancel();

        assert_eq!(engine.poll().await.unwrap(), PollOutcome::Cancelled);
        assert_eq!(engine.status(), Some(RequestStatus::Cancelled));
    }

    // ── Resume from redirect return ─────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn resume_from_return_polls_the_returned_id() {
        let mut engine = engine_with(
            ScriptedSource::ready_on(1, balance_payload()),
            RecordingGateway::accepting(),
        );

        let id = engine
            .resume_from_return("vouch=binance&requestId=abc-123")
            .unwrap()
            .clone();
        assert_eq!(id.as_str(), "abc-123");
        assert_eq!(engine.status(), Some(RequestStatus::Polling));

        let outcome = engine.poll().await.unwrap();
        assert!(matches!(outcome, PollOutcome::Proof(_)));
    }

    #[tokio::test]
    async fn resume_from_garbage_return_is_configuration_error() {
        let mut engine = engine_with(
            ScriptedSource::never_ready(),
            RecordingGateway::accepting(),
        );
        let result = engine.resume_from_return("utm_source=mail");
        assert!(matches!(result, Err(FlowError::Configuration(_))));
    }

    // ── Submission failure ──────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn submission_failure_fails_the_attempt_verbatim_without_retry() {
        let mut engine = engine_with(
            ScriptedSource::ready_on(1, balance_payload()),
            RecordingGateway::rejecting(),
        );

        engine.start(Provider::Binance, Some("USDT")).unwrap();
        engine.poll().await.unwrap();

        let result = engine.complete(&wallet()).await;
        match result {
            Err(FlowError::Submission(ChainError::Rejected(reason))) => {
                assert_eq!(reason, "gas estimation failed");
            }
            other => panic!("expected submission rejection, got {other:?}"),
        }
        assert_eq!(engine.status(), Some(RequestStatus::Failed));
        assert_eq!(engine.gateway.submits.load(Ordering::SeqCst), 1);

        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(e, FlowEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn complete_without_proof_is_invalid() {
        let mut engine = engine_with(
            ScriptedSource::never_ready(),
            RecordingGateway::accepting(),
        );
        engine.start(Provider::Wise, None).unwrap();
        assert!(matches!(
            engine.complete(&wallet()).await,
            Err(FlowError::InvalidState { .. })
        ));
    }
}
