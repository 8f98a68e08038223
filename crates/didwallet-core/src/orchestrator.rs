//! Demo orchestrator: two parties, two wallets, one authenticated exchange
//! in each direction.
//!
//! The run is sequential. Every operation is recorded as a [`StepOutcome`],
//! so a failure never panics and never hides the remaining steps. Teardown
//! (close, then delete) runs on every path, including an abort under
//! [`FailurePolicy::Abort`].
//!
//! ```ignore
//! let service = LocalWalletService::new(root, RuntimeConfig::with_pool_size(2))?;
//! let report = DemoOrchestrator::new(&service).run(&DemoScenario::standard());
//! for step in &report.steps {
//!     println!("{}", step);
//! }
//! ```

use crate::config::{DidOptions, RuntimeConfig, StorageType, WalletConfig, WalletCredentials};
use crate::error::{ErrorKind, WalletError};
use crate::identity::{Did, Verkey};
use crate::service::WalletService;
use crate::session::WalletSession;
use std::fmt;
use std::ops::ControlFlow;
use tracing::{info, warn};

/// One participant: a named identity with its own wallet.
#[derive(Debug, Clone)]
pub struct Party {
    pub name: String,
    pub wallet_config: WalletConfig,
    pub credentials: WalletCredentials,
}

impl Party {
    pub fn new(name: impl Into<String>, wallet_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wallet_config: WalletConfig::new(wallet_id),
            credentials: WalletCredentials::new(key),
        }
    }
}

/// What to do after a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure and keep going
    #[default]
    Continue,
    /// Stop at the first failure, then tear down
    Abort,
}

/// Inputs of one demo run.
#[derive(Debug, Clone)]
pub struct DemoScenario {
    /// Runtime the scenario expects the service to run with
    pub runtime: RuntimeConfig,
    pub first: Party,
    pub second: Party,
    pub policy: FailurePolicy,
    /// Delete both wallets during teardown
    pub delete_wallets: bool,
}

impl DemoScenario {
    /// personA and personB with their default wallets, pool size 2.
    pub fn standard() -> Self {
        Self {
            runtime: RuntimeConfig::with_pool_size(2),
            first: Party::new("personA", "personAWallet", "personA_wallet_key"),
            second: Party::new("personB", "personBWallet", "personB_wallet_key"),
            policy: FailurePolicy::Continue,
            delete_wallets: true,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Put both wallets on the given storage backend.
    pub fn with_storage(mut self, storage_type: StorageType) -> Self {
        self.first.wallet_config.storage_type = storage_type;
        self.second.wallet_config.storage_type = storage_type;
        self
    }

    pub fn keep_wallets(mut self) -> Self {
        self.delete_wallets = false;
        self
    }
}

/// Operations the orchestrator performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ConfigureRuntime,
    CreateWallet,
    OpenWallet,
    CreateDid,
    ListDids,
    Encrypt,
    Decrypt,
    CloseWallet,
    DeleteWallet,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ConfigureRuntime => "configure-runtime",
            Step::CreateWallet => "create-wallet",
            Step::OpenWallet => "open-wallet",
            Step::CreateDid => "create-did",
            Step::ListDids => "list-dids",
            Step::Encrypt => "encrypt",
            Step::Decrypt => "decrypt",
            Step::CloseWallet => "close-wallet",
            Step::DeleteWallet => "delete-wallet",
        };
        f.write_str(name)
    }
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded(String),
    /// An error the scenario accepts, like a wallet that already exists
    Tolerated(ErrorKind, String),
    Failed(ErrorKind, String),
    /// Not attempted because an input was missing
    Skipped(String),
}

impl StepStatus {
    fn from_error(error: &WalletError) -> Self {
        StepStatus::Failed(error.kind(), error.to_string())
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepStatus::Failed(..))
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, StepStatus::Succeeded(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepStatus::Skipped(_))
    }
}

/// One recorded step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: Step,
    /// Party the step acted for; `None` for scenario-wide steps
    pub party: Option<String>,
    pub status: StepStatus,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let who = self.party.as_deref().unwrap_or("-");
        match &self.status {
            StepStatus::Succeeded(detail) => write!(f, "[ok]   {} {}: {}", who, self.step, detail),
            StepStatus::Tolerated(kind, detail) => {
                write!(f, "[warn] {} {}: {} ({})", who, self.step, detail, kind)
            }
            StepStatus::Failed(kind, detail) => {
                write!(f, "[fail] {} {}: {} ({})", who, self.step, detail, kind)
            }
            StepStatus::Skipped(reason) => write!(f, "[skip] {} {}: {}", who, self.step, reason),
        }
    }
}

/// One message sent from one party to the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub from: String,
    pub to: String,
    pub plaintext: String,
    pub ciphertext_len: usize,
    /// Text recovered by the recipient, if decryption succeeded
    pub decrypted: Option<String>,
    /// Whether the sender revealed by decryption is the real sender
    pub sender_verkey_matches: bool,
}

/// Everything a run did.
#[derive(Debug, Clone, Default)]
pub struct ScenarioReport {
    pub steps: Vec<StepOutcome>,
    pub exchanges: Vec<Exchange>,
    /// Stopped early under [`FailurePolicy::Abort`]
    pub aborted: bool,
}

impl ScenarioReport {
    pub fn failed(&self) -> Vec<&StepOutcome> {
        self.steps.iter().filter(|s| s.status.is_failed()).collect()
    }

    pub fn succeeded_count(&self) -> usize {
        self.steps.iter().filter(|s| s.status.is_succeeded()).count()
    }

    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed().is_empty()
    }

    /// First outcome of `step` for `party`.
    pub fn outcome(&self, step: Step, party: &str) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|s| s.step == step && s.party.as_deref() == Some(party))
    }

    /// Index of the first outcome of `step` for `party`.
    pub fn position(&self, step: Step, party: &str) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| s.step == step && s.party.as_deref() == Some(party))
    }
}

/// Per-party progress through the scenario.
struct PartyState<'a, 'p, S: WalletService + ?Sized> {
    party: &'p Party,
    created: bool,
    opened: bool,
    session: Option<WalletSession<'a, S>>,
    identity: Option<(Did, Verkey)>,
}

impl<'a, 'p, S: WalletService + ?Sized> PartyState<'a, 'p, S> {
    fn new(party: &'p Party) -> Self {
        Self {
            party,
            created: false,
            opened: false,
            session: None,
            identity: None,
        }
    }

    fn name(&self) -> &str {
        &self.party.name
    }
}

/// Drives a [`DemoScenario`] against a wallet service.
pub struct DemoOrchestrator<'a, S: WalletService + ?Sized> {
    service: &'a S,
}

impl<'a, S: WalletService + ?Sized> DemoOrchestrator<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Run the scenario to completion and report every step.
    pub fn run(&self, scenario: &DemoScenario) -> ScenarioReport {
        let mut recorder = Recorder {
            report: ScenarioReport::default(),
            policy: scenario.policy,
        };
        let mut first = PartyState::new(&scenario.first);
        let mut second = PartyState::new(&scenario.second);

        info!(
            first = %scenario.first.name,
            second = %scenario.second.name,
            policy = ?scenario.policy,
            "Scenario started"
        );

        let _ = self.run_main(scenario, &mut recorder, &mut first, &mut second);

        if recorder.report.aborted {
            warn!("Scenario aborted, tearing down");
        }
        self.teardown(scenario, &mut recorder, &mut first);
        self.teardown(scenario, &mut recorder, &mut second);

        let report = recorder.report;
        info!(
            steps = report.steps.len(),
            succeeded = report.succeeded_count(),
            failed = report.failed().len(),
            aborted = report.aborted,
            "Scenario finished"
        );
        report
    }

    fn run_main(
        &self,
        scenario: &DemoScenario,
        recorder: &mut Recorder,
        first: &mut PartyState<'a, '_, S>,
        second: &mut PartyState<'a, '_, S>,
    ) -> ControlFlow<()> {
        self.configure_runtime(scenario, recorder)?;
        self.set_up(recorder, first)?;
        self.set_up(recorder, second)?;
        self.exchange(recorder, first, second)?;
        self.exchange(recorder, second, first)
    }

    fn configure_runtime(&self, scenario: &DemoScenario, recorder: &mut Recorder) -> ControlFlow<()> {
        let actual = self.service.runtime_config();
        let status = if *actual == scenario.runtime {
            StepStatus::Succeeded(format!(
                "crypto_thread_pool_size={}",
                actual.crypto_thread_pool_size
            ))
        } else {
            StepStatus::Tolerated(
                ErrorKind::InvalidInput,
                format!(
                    "service runs with crypto_thread_pool_size={}, scenario asked for {}",
                    actual.crypto_thread_pool_size, scenario.runtime.crypto_thread_pool_size
                ),
            )
        };
        recorder.record(Step::ConfigureRuntime, None, status)
    }

    fn set_up(&self, recorder: &mut Recorder, state: &mut PartyState<'a, '_, S>) -> ControlFlow<()> {
        let party = state.party;
        let name = Some(party.name.as_str());

        // Create: an existing wallet is accepted as-is
        let status = match self
            .service
            .create_wallet(&party.wallet_config, &party.credentials)
        {
            Ok(()) => {
                state.created = true;
                StepStatus::Succeeded(format!("wallet {} created", party.wallet_config.id))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                state.created = true;
                StepStatus::Tolerated(e.kind(), e.to_string())
            }
            Err(e) => StepStatus::from_error(&e),
        };
        recorder.record(Step::CreateWallet, name, status)?;

        // Open
        let status = if !state.created {
            StepStatus::Skipped("wallet was not created".to_string())
        } else {
            match WalletSession::open(self.service, &party.wallet_config, &party.credentials) {
                Ok(session) => {
                    let detail = format!("handle {}", session.handle());
                    state.opened = true;
                    state.session = Some(session);
                    StepStatus::Succeeded(detail)
                }
                Err(e) => StepStatus::from_error(&e),
            }
        };
        recorder.record(Step::OpenWallet, name, status)?;

        // DID
        let status = match &state.session {
            None => StepStatus::Skipped("no open wallet".to_string()),
            Some(session) => match self
                .service
                .create_and_store_my_did(session.handle(), &DidOptions::default())
            {
                Ok((did, verkey)) => {
                    let detail = format!("did {} verkey {}", did, verkey);
                    state.identity = Some((did, verkey));
                    StepStatus::Succeeded(detail)
                }
                Err(e) => StepStatus::from_error(&e),
            },
        };
        recorder.record(Step::CreateDid, name, status)?;

        // List
        let status = match &state.session {
            None => StepStatus::Skipped("no open wallet".to_string()),
            Some(session) => match self.service.list_my_dids_with_metadata(session.handle()) {
                Ok(dids) => {
                    let listed: Vec<&str> = dids.iter().map(|d| d.did.as_str()).collect();
                    StepStatus::Succeeded(format!("{} DID(s): {}", dids.len(), listed.join(", ")))
                }
                Err(e) => StepStatus::from_error(&e),
            },
        };
        recorder.record(Step::ListDids, name, status)
    }

    fn exchange(
        &self,
        recorder: &mut Recorder,
        sender: &PartyState<'a, '_, S>,
        recipient: &PartyState<'a, '_, S>,
    ) -> ControlFlow<()> {
        let plaintext = format!("{} -> {}", sender.name(), recipient.name());

        let encrypt_inputs = match (&sender.session, &sender.identity, &recipient.identity) {
            (Some(session), Some((_, sender_vk)), Some((_, recipient_vk))) => {
                Some((session.handle(), sender_vk, recipient_vk))
            }
            _ => None,
        };

        let mut ciphertext = None;
        let status = match encrypt_inputs {
            None => StepStatus::Skipped("sender or recipient identity missing".to_string()),
            Some((handle, sender_vk, recipient_vk)) => {
                match self
                    .service
                    .auth_crypt(handle, sender_vk, recipient_vk, plaintext.as_bytes())
                {
                    Ok(bytes) => {
                        let detail = format!("{:?} as {} bytes", plaintext, bytes.len());
                        ciphertext = Some(bytes);
                        StepStatus::Succeeded(detail)
                    }
                    Err(e) => StepStatus::from_error(&e),
                }
            }
        };
        recorder.record(Step::Encrypt, Some(sender.name()), status)?;

        let Some(ciphertext) = ciphertext else {
            return recorder.record(
                Step::Decrypt,
                Some(recipient.name()),
                StepStatus::Skipped("nothing was encrypted".to_string()),
            );
        };

        let mut exchange = Exchange {
            from: sender.name().to_string(),
            to: recipient.name().to_string(),
            plaintext,
            ciphertext_len: ciphertext.len(),
            decrypted: None,
            sender_verkey_matches: false,
        };

        let status = match (&recipient.session, &recipient.identity, &sender.identity) {
            (Some(session), Some((_, recipient_vk)), Some((_, sender_vk))) => {
                match self
                    .service
                    .auth_decrypt(session.handle(), recipient_vk, &ciphertext)
                {
                    Ok(decrypted) => {
                        let text = String::from_utf8_lossy(&decrypted.message).into_owned();
                        exchange.sender_verkey_matches = decrypted.sender_verkey == *sender_vk;
                        exchange.decrypted = Some(text.clone());
                        if exchange.sender_verkey_matches {
                            StepStatus::Succeeded(format!("{:?} from {}", text, decrypted.sender_verkey))
                        } else {
                            StepStatus::Failed(
                                ErrorKind::AuthFailure,
                                format!(
                                    "sender verkey {} does not match {}",
                                    decrypted.sender_verkey, sender_vk
                                ),
                            )
                        }
                    }
                    Err(e) => StepStatus::from_error(&e),
                }
            }
            _ => StepStatus::Skipped("recipient has no open wallet".to_string()),
        };
        recorder.report.exchanges.push(exchange);
        recorder.record(Step::Decrypt, Some(recipient.name()), status)
    }

    /// Close, then delete. Failures here are recorded but never stop teardown.
    fn teardown(&self, scenario: &DemoScenario, recorder: &mut Recorder, state: &mut PartyState<'a, '_, S>) {
        let party = state.party;
        let name = Some(party.name.as_str());

        let closed = match state.session.take() {
            None => {
                recorder.push(
                    Step::CloseWallet,
                    name,
                    StepStatus::Skipped("wallet was not opened".to_string()),
                );
                false
            }
            Some(session) => {
                let handle = session.handle();
                match session.close() {
                    Ok(()) => {
                        recorder.push(Step::CloseWallet, name, StepStatus::Succeeded(format!("handle {}", handle)));
                        true
                    }
                    Err(e) => {
                        recorder.push(Step::CloseWallet, name, StepStatus::from_error(&e));
                        false
                    }
                }
            }
        };

        let status = if !scenario.delete_wallets {
            StepStatus::Skipped("keeping wallets".to_string())
        } else if !state.created {
            StepStatus::Skipped("wallet was not created".to_string())
        } else if state.opened && !closed {
            StepStatus::Skipped("wallet was not closed".to_string())
        } else {
            match self
                .service
                .delete_wallet(&party.wallet_config, &party.credentials)
            {
                Ok(()) => StepStatus::Succeeded(format!("wallet {} deleted", party.wallet_config.id)),
                Err(e) => StepStatus::from_error(&e),
            }
        };
        recorder.push(Step::DeleteWallet, name, status);
    }
}

struct Recorder {
    report: ScenarioReport,
    policy: FailurePolicy,
}

impl Recorder {
    fn push(&mut self, step: Step, party: Option<&str>, status: StepStatus) {
        let outcome = StepOutcome {
            step,
            party: party.map(str::to_string),
            status,
        };
        match &outcome.status {
            StepStatus::Failed(..) => warn!(%step, party = party.unwrap_or("-"), "{}", outcome),
            _ => info!(%step, party = party.unwrap_or("-"), "{}", outcome),
        }
        self.report.steps.push(outcome);
    }

    /// Push an outcome and decide whether the scenario goes on.
    fn record(&mut self, step: Step, party: Option<&str>, status: StepStatus) -> ControlFlow<()> {
        let failed = status.is_failed();
        self.push(step, party, status);
        if failed && self.policy == FailurePolicy::Abort {
            self.report.aborted = true;
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}
