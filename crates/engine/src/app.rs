//! Application state and composition.

use std::sync::Arc;
use std::time::Duration;

use milestones_domain::{ProgressionCatalog, TutorialCatalog};

use crate::infrastructure::{
    clock::SystemClock,
    memory::{InMemoryProgressionStore, InMemoryTutorialStore, InMemoryWallet},
    ports::{ClockPort, ProgressionStateRepo, TutorialStateRepo, WalletPort},
};
use crate::use_cases::progression::{
    GetProgressions, ProgressionUseCases, PurchaseProgression, UpdateProgression,
};
use crate::use_cases::tutorial::{
    AbandonTutorial, AcceptTutorial, DeclineTutorial, GetTutorials, TutorialUseCases,
    UpdateTutorial,
};
use crate::use_cases::RequestContext;

/// Port implementations supplied by the host runtime.
pub struct Ports {
    pub progression_repo: Arc<dyn ProgressionStateRepo>,
    pub tutorial_repo: Arc<dyn TutorialStateRepo>,
    pub wallet: Arc<dyn WalletPort>,
    pub clock: Arc<dyn ClockPort>,
}

/// Concrete in-memory adapters, kept so callers can seed and inspect them.
pub struct InMemoryAdapters {
    pub progressions: Arc<InMemoryProgressionStore>,
    pub tutorials: Arc<InMemoryTutorialStore>,
    pub wallet: Arc<InMemoryWallet>,
}

impl InMemoryAdapters {
    pub fn new() -> Self {
        Self {
            progressions: Arc::new(InMemoryProgressionStore::new()),
            tutorials: Arc::new(InMemoryTutorialStore::new()),
            wallet: Arc::new(InMemoryWallet::new()),
        }
    }

    pub fn ports(&self, clock: Arc<dyn ClockPort>) -> Ports {
        Ports {
            progression_repo: self.progressions.clone(),
            tutorial_repo: self.tutorials.clone(),
            wallet: self.wallet.clone(),
            clock,
        }
    }
}

impl Default for InMemoryAdapters {
    fn default() -> Self {
        Self::new()
    }
}

/// Main application state.
///
/// Both catalogs are immutable and shared; the use cases hold nothing else
/// but ports, so one `App` serves any number of concurrent callers.
pub struct App {
    pub progression: ProgressionUseCases,
    pub tutorials: TutorialUseCases,
    clock: Arc<dyn ClockPort>,
    request_timeout: Option<Duration>,
}

impl App {
    /// Create a new App with all use cases wired to `ports`.
    pub fn new(
        progressions: Arc<ProgressionCatalog>,
        tutorials: Arc<TutorialCatalog>,
        ports: Ports,
    ) -> Self {
        let Ports {
            progression_repo,
            tutorial_repo,
            wallet,
            clock,
        } = ports;

        let progression = ProgressionUseCases::new(
            Arc::new(GetProgressions::new(
                progressions.clone(),
                progression_repo.clone(),
                clock.clone(),
            )),
            Arc::new(PurchaseProgression::new(
                progressions.clone(),
                progression_repo.clone(),
                wallet,
                clock.clone(),
            )),
            Arc::new(UpdateProgression::new(
                progressions,
                progression_repo,
                clock.clone(),
            )),
        );

        let tutorial_uc = TutorialUseCases::new(
            Arc::new(GetTutorials::new(
                tutorials.clone(),
                tutorial_repo.clone(),
                clock.clone(),
            )),
            Arc::new(AcceptTutorial::new(
                tutorials.clone(),
                tutorial_repo.clone(),
                clock.clone(),
            )),
            Arc::new(DeclineTutorial::new(
                tutorials.clone(),
                tutorial_repo.clone(),
                clock.clone(),
            )),
            Arc::new(AbandonTutorial::new(
                tutorials.clone(),
                tutorial_repo.clone(),
                clock.clone(),
            )),
            Arc::new(UpdateTutorial::new(tutorials, tutorial_repo, clock.clone())),
        );

        Self {
            progression,
            tutorials: tutorial_uc,
            clock,
            request_timeout: None,
        }
    }

    /// App backed by fresh in-memory adapters and the system clock.
    pub fn in_memory(
        progressions: Arc<ProgressionCatalog>,
        tutorials: Arc<TutorialCatalog>,
    ) -> (Self, InMemoryAdapters) {
        let adapters = InMemoryAdapters::new();
        let app = Self::new(
            progressions,
            tutorials,
            adapters.ports(Arc::new(SystemClock::new())),
        );
        (app, adapters)
    }

    /// Deadline applied by [`App::request_context`].
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Fresh context carrying the configured default deadline, if any.
    pub fn request_context(&self) -> RequestContext {
        let ctx = RequestContext::new();
        match self.request_timeout {
            Some(timeout) => ctx.with_timeout(self.clock.as_ref(), timeout),
            None => ctx,
        }
    }
}
