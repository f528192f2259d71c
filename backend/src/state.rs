//! Shared application state for handlers and middleware.

use std::sync::Arc;

use adapters::{IdentityProvider, SignedTokenProvider, TrustedHeaderProvider};

use crate::config::{AppConfig, IdentityConfig};
use crate::database::{self, Store};
use crate::errors::StartupError;
use crate::services::merch::MerchPuzzle;
use crate::services::registration::Registration;
use crate::services::resolver::ApplicationResolver;
use crate::services::review::Review;
use crate::utils::{Clock, SystemClock};

#[derive(Clone)]
pub struct AppState {
    /// Loaded once at startup, never mutated.
    pub config: Arc<AppConfig>,

    pub store: Arc<dyn Store>,

    pub identity: Arc<dyn IdentityProvider>,

    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            identity,
            clock,
        }
    }

    /// Wires collaborators from configuration.
    pub async fn bootstrap(config: AppConfig) -> Result<Self, StartupError> {
        let store = database::connect(&config.storage).await?;
        let identity = identity_provider(&config.identity)?;
        tracing::info!(provider = identity.name(), "Identity provider ready");

        Ok(Self::new(config, store, identity, Arc::new(SystemClock)))
    }

    pub fn resolver(&self) -> ApplicationResolver<'_> {
        ApplicationResolver::new(self.store.as_ref(), self.config.cycle)
    }

    /// Write operations, stamped with the current instant.
    pub fn registration(&self) -> Registration<'_> {
        Registration::new(self.store.as_ref(), self.config.cycle, self.clock.now())
    }

    pub fn review(&self) -> Review<'_> {
        Review::new(self.store.as_ref())
    }

    pub fn merch(&self) -> MerchPuzzle<'_> {
        MerchPuzzle::new(&self.config.merch)
    }
}

fn identity_provider(config: &IdentityConfig) -> Result<Arc<dyn IdentityProvider>, StartupError> {
    match config {
        IdentityConfig::SignedToken {
            issuer_public_key,
            cookie_name,
        } => Ok(Arc::new(SignedTokenProvider::from_hex(
            issuer_public_key,
            cookie_name.clone(),
        )?)),
        IdentityConfig::TrustedHeader => {
            tracing::warn!("Trusting x-user-id/x-user-role headers; run behind an authenticating proxy");
            Ok(Arc::new(TrustedHeaderProvider::default()))
        }
    }
}
