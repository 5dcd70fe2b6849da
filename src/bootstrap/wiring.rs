//! # Dependency wiring
//!
//! Builds every use case from the configured adapters plus the UI-side
//! collaborators the host application supplies.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, info_span, Instrument};

use ob_app::{
    DeferredActionCoordinator, FederatedSignIn, FederatedVerifier, OnboardingOrchestrator,
    OtpVerifier, PasswordResetFlow, RegistrationFlow, SessionStore, SignIn,
};
use ob_core::auth::FederatedProvider;
use ob_core::config::AppConfig;
use ob_core::ports::{
    ActionExecutorPort, AuthBackendPort, DurableStorePort, IdentityProviderPort, NavigationPort,
    OnboardingEventPort, ProfileBackendPort,
};
use ob_core::session::Session;
use ob_infra::{default_data_dir, FileDurableStore, HttpAuthBackend};

/// Collaborators owned by the host UI.
pub struct UiPorts {
    pub navigation: Arc<dyn NavigationPort>,
    pub executor: Arc<dyn ActionExecutorPort>,
    pub onboarding_events: Arc<dyn OnboardingEventPort>,
    /// One per supported provider SDK.
    pub identity_providers: Vec<Arc<dyn IdentityProviderPort>>,
}

/// Fully wired session and onboarding services.
pub struct OnboardRuntime {
    pub session: Arc<SessionStore>,
    pub sign_in: Arc<SignIn>,
    pub otp: OtpVerifier,
    pub registration: RegistrationFlow,
    pub password_reset: PasswordResetFlow,
    pub onboarding: Arc<OnboardingOrchestrator>,
    pub coordinator: Arc<DeferredActionCoordinator>,
    federated: HashMap<FederatedProvider, FederatedSignIn>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl OnboardRuntime {
    /// Restore the persisted session and start replaying deferred actions on
    /// session changes. Safe to call more than once.
    pub async fn start(&self) -> Session {
        let mut listener = self.listener.lock().await;
        if listener.is_none() {
            let events = self.session.subscribe().await;
            *listener = Some(self.coordinator.clone().spawn_listener(events));
        }
        drop(listener);

        let session = self
            .session
            .restore()
            .instrument(info_span!("bootstrap.runtime.start"))
            .await;
        info!(
            signed_in = session.is_signed_in(),
            ready = session.is_ready(),
            "onboard runtime started"
        );
        session
    }

    pub fn federated(&self, provider: FederatedProvider) -> Option<&FederatedSignIn> {
        self.federated.get(&provider)
    }
}

impl Drop for OnboardRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.get_mut().take() {
            handle.abort();
        }
    }
}

/// Wire the runtime against the file store and HTTP backend from `config`.
pub fn build_runtime(config: &AppConfig, ports: UiPorts) -> anyhow::Result<OnboardRuntime> {
    let data_dir = match &config.storage.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir().context("resolve data dir failed")?,
    };
    let durable = Arc::new(FileDurableStore::with_base_dir(
        &data_dir,
        &config.storage.session_file,
    ));
    info!(path = %durable.path().display(), base_url = %config.api.base_url, "wiring onboard runtime");

    let backend = Arc::new(HttpAuthBackend::from_config(&config.api)?);
    Ok(build_runtime_with(durable, backend, ports))
}

/// Wire the runtime against arbitrary adapters.
pub fn build_runtime_with<B>(
    durable: Arc<dyn DurableStorePort>,
    backend: Arc<B>,
    ports: UiPorts,
) -> OnboardRuntime
where
    B: AuthBackendPort + ProfileBackendPort + 'static,
{
    let auth: Arc<dyn AuthBackendPort> = backend.clone();
    let profile: Arc<dyn ProfileBackendPort> = backend;

    let session = Arc::new(SessionStore::new(durable));
    let sign_in = Arc::new(SignIn::new(auth.clone(), session.clone()));
    let onboarding = Arc::new(OnboardingOrchestrator::new(
        profile,
        session.clone(),
        ports.onboarding_events,
    ));
    let coordinator = Arc::new(DeferredActionCoordinator::new(
        session.clone(),
        ports.navigation,
        ports.executor,
    ));

    let federated = ports
        .identity_providers
        .into_iter()
        .map(|provider| {
            (
                provider.provider(),
                FederatedSignIn::new(
                    provider,
                    FederatedVerifier::new(auth.clone()),
                    sign_in.clone(),
                ),
            )
        })
        .collect();

    OnboardRuntime {
        otp: OtpVerifier::new(auth.clone()),
        registration: RegistrationFlow::new(auth.clone()),
        password_reset: PasswordResetFlow::new(auth),
        session,
        sign_in,
        onboarding,
        coordinator,
        federated,
        listener: Mutex::new(None),
    }
}
