//! List loading with stale-response protection.
//!
//! Loads may overlap (startup plus a focus refresh, say). Each load takes a
//! ticket from a generation counter and its result is applied only if no
//! newer load has started since. Superseded results are discarded without
//! touching the local store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::DatabaseError;
use crate::persistence::PersistenceBridge;

use super::merge::{MergedOrganization, merge};
use super::DirectoryClient;

/// Identifies one load. Newer tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// The list as last applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListView {
    pub entries: Vec<MergedOrganization>,
    /// Set when the API could not be reached and only local entries show.
    pub api_error: Option<String>,
}

/// Loads, merges, and publishes the organization list.
pub struct ListLoader {
    client: Arc<dyn DirectoryClient>,
    bridge: PersistenceBridge,
    generation: AtomicU64,
    current: RwLock<ListView>,
}

impl ListLoader {
    pub fn new(client: Arc<dyn DirectoryClient>, bridge: PersistenceBridge) -> Self {
        Self {
            client,
            bridge,
            generation: AtomicU64::new(0),
            current: RwLock::new(ListView::default()),
        }
    }

    /// Start a new load, superseding any in flight.
    pub fn begin(&self) -> LoadTicket {
        LoadTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` belongs to the newest load.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// The last applied view.
    pub async fn current(&self) -> ListView {
        self.current.read().await.clone()
    }

    /// Fetch, merge, clean the local store, and publish.
    ///
    /// Returns `None` if a newer load started while this one was running.
    pub async fn load(&self) -> Result<Option<ListView>, DatabaseError> {
        let ticket = self.begin();

        let (api, api_error) = match self.client.list_organizations().await {
            Ok(list) => (list, None),
            Err(e) => {
                warn!(error = %e, "Organization list unavailable; showing local entries only");
                (Vec::new(), Some(e.to_string()))
            }
        };
        let local = self.bridge.load_local_list().await?;

        if !self.is_current(ticket) {
            debug!(?ticket, "Discarding superseded list load");
            return Ok(None);
        }

        let outcome = merge(&api, &local);
        if outcome.dropped > 0 {
            if outcome.surviving_local.is_empty() {
                self.bridge.remove_local_list().await?;
            } else {
                self.bridge
                    .replace_local_list(&outcome.surviving_local)
                    .await?;
            }
            info!(
                dropped = outcome.dropped,
                remaining = outcome.surviving_local.len(),
                "Pruned local organization list"
            );
        }

        let view = ListView {
            entries: outcome.merged,
            api_error,
        };

        let mut current = self.current.write().await;
        if !self.is_current(ticket) {
            debug!(?ticket, "Discarding superseded list load");
            return Ok(None);
        }
        *current = view.clone();
        Ok(Some(view))
    }

    /// Re-run the merge when the view regains focus. Same as [`load`](Self::load).
    pub async fn on_focus(&self) -> Result<Option<ListView>, DatabaseError> {
        self.load().await
    }
}
