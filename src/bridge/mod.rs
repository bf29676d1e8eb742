//! Bridge engine - keeps the panel in sync with SuperConductor
//!
//! Two schedules drive all work: a slow structural refresh that rebuilds the
//! mirror and the panel surface, and a faster subscription tick that probes
//! only the groups some feedback is watching.

mod actions;
mod engine;
mod feedback;
mod prober;
mod structure;

pub use engine::{create_bridge_channels, BridgeEngine};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::client::RemoteClient;
use crate::config::Config;
use crate::error::BridgeError;
use crate::host::{ConnectionStatus, PanelHost};
use crate::model::{Mirror, SubscriptionRegistry};
use crate::surface::ActionId;

/// Requests sent to the engine by the host or the process
#[derive(Debug, Clone)]
pub enum BridgeCommand {
    /// A command button was pressed
    ExecuteAction {
        action: ActionId,
        selector: Option<String>,
    },
    /// A feedback instance became visible
    SubscribeFeedback {
        feedback_id: String,
        selector: Option<String>,
    },
    /// A feedback instance went away
    UnsubscribeFeedback {
        feedback_id: String,
        selector: Option<String>,
    },
    /// New configuration from the host
    ConfigUpdated(Config),
    /// Stop both schedules and exit
    Shutdown,
}

/// Shared handle to the bridge state
///
/// Cloning is cheap. The mirror and the subscription registry are only
/// mutated through methods on this type.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Shared>,
}

struct Shared {
    client: RwLock<RemoteClient>,
    mirror: RwLock<Mirror>,
    subscriptions: Mutex<SubscriptionRegistry>,
    host: Arc<dyn PanelHost>,
    status: Mutex<Option<ConnectionStatus>>,
    shutdown: CancellationToken,
}

impl Bridge {
    pub fn new(client: RemoteClient, host: Arc<dyn PanelHost>) -> Self {
        Self {
            inner: Arc::new(Shared {
                client: RwLock::new(client),
                mirror: RwLock::new(Mirror::new()),
                subscriptions: Mutex::new(SubscriptionRegistry::new()),
                host,
                status: Mutex::new(None),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Point the bridge at another SuperConductor instance
    pub fn set_client(&self, client: RemoteClient) {
        *self
            .inner
            .client
            .write()
            .unwrap_or_else(PoisonError::into_inner) = client;
    }

    fn client(&self) -> RemoteClient {
        self.inner
            .client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn mirror(&self) -> RwLockReadGuard<'_, Mirror> {
        self.inner.mirror.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn mirror_mut(&self) -> RwLockWriteGuard<'_, Mirror> {
        self.inner.mirror.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscriptions(&self) -> MutexGuard<'_, SubscriptionRegistry> {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn host(&self) -> &dyn PanelHost {
        self.inner.host.as_ref()
    }

    /// Token cancelled on teardown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    /// Stop the bridge; results of requests still in flight are discarded
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    fn report_ok(&self) {
        let mut status = self.inner.status.lock().unwrap_or_else(PoisonError::into_inner);
        if *status != Some(ConnectionStatus::Ok) {
            *status = Some(ConnectionStatus::Ok);
            self.host().update_status(ConnectionStatus::Ok, None);
        }
    }

    /// Log a failed request and flag connectivity problems to the host
    ///
    /// Unexpected response shapes are only worth a warning.
    fn report_failure(&self, context: &str, err: &BridgeError) {
        if !err.is_connectivity() {
            warn!("{}: {}", context, err);
            return;
        }
        error!("{}: {}", context, err);
        if !self.is_shut_down() {
            *self.inner.status.lock().unwrap_or_else(PoisonError::into_inner) =
                Some(ConnectionStatus::ConnectionFailure);
            self.host()
                .update_status(ConnectionStatus::ConnectionFailure, Some(&err.to_string()));
        }
    }
}
