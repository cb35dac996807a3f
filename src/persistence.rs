//! Persistence bridge for edit snapshots, setup progress, and the fallback
//! organization list.
//!
//! Everything here is a best-effort cache; the backend is authoritative.
//! Stored JSON that fails to parse is treated as absent and only logged.
//! Store errors themselves are still returned.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::{KeyValueStore, StorageKey, StorageScope};
use crate::wizard::fields::{Authorization, BasicInfo, Compliance, FieldBag, Technical, UseCase};
use crate::wizard::{OrganizationId, Step};

/// Status written on summaries created by the wizard.
pub const DEFAULT_PRODUCT_STATUS: &str = "Pending";

/// A pre-fill blob for edit mode. Every group is optional in the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSnapshot {
    pub organization_id: Option<String>,
    pub basic_info: BasicInfo,
    pub compliance: Compliance,
    pub technical: Technical,
    pub use_case: UseCase,
    pub authorization: Authorization,
}

impl EditSnapshot {
    pub fn into_fields(self) -> FieldBag {
        FieldBag {
            basic_info: self.basic_info,
            compliance: self.compliance,
            technical: self.technical,
            use_case: self.use_case,
            authorization: self.authorization,
        }
    }

    pub fn from_fields(organization_id: &OrganizationId, fields: &FieldBag) -> Self {
        Self {
            organization_id: Some(organization_id.to_string()),
            basic_info: fields.basic_info.clone(),
            compliance: fields.compliance.clone(),
            technical: fields.technical.clone(),
            use_case: fields.use_case.clone(),
            authorization: fields.authorization.clone(),
        }
    }
}

/// Which step of which organization was last submitted successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupProgress {
    pub organization_id: OrganizationId,
    pub completed_step: Step,
    #[serde(default)]
    pub is_edit_mode: bool,
    /// `data` from the last successful response (file ids and the like).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<serde_json::Value>,
}

/// A denormalized list entry written after the final step succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub merchant_id: String,
    #[serde(default)]
    pub product_status: String,
}

impl OrganizationSummary {
    /// Derive the summary from the collected fields.
    pub fn from_session(organization_id: &OrganizationId, fields: &FieldBag) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: fields.basic_info.legal_entity_name.trim().to_string(),
            email: fields.primary_contact_email(),
            merchant_id: organization_id.to_string(),
            product_status: DEFAULT_PRODUCT_STATUS.to_string(),
        }
    }
}

/// What `save_summary` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Appended,
    Replaced,
}

/// Typed read/write contracts over the key-value store.
#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read and parse a JSON value. Missing or malformed data yields `None`.
    pub async fn load_json<T: DeserializeOwned>(
        &self,
        key: StorageKey,
    ) -> Result<Option<T>, DatabaseError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                debug!(%key, error = %e, "Ignoring malformed stored JSON");
                Ok(None)
            }
        }
    }

    pub async fn save_json<T: Serialize>(
        &self,
        key: StorageKey,
        value: &T,
    ) -> Result<(), DatabaseError> {
        let raw =
            serde_json::to_string(value).map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.store.set(key, &raw).await
    }

    /// Drop every session-scoped key. Local entries survive.
    pub async fn clear_session(&self) -> Result<usize, DatabaseError> {
        let removed = self.store.clear_scope(StorageScope::Session).await?;
        info!(removed, "Cleared session state");
        Ok(removed)
    }

    // ── Edit snapshot ───────────────────────────────────────────────

    pub async fn load_edit_snapshot(&self) -> Result<Option<EditSnapshot>, DatabaseError> {
        self.load_json(StorageKey::EditOrganization).await
    }

    pub async fn save_edit_snapshot(&self, snapshot: &EditSnapshot) -> Result<(), DatabaseError> {
        self.save_json(StorageKey::EditOrganization, snapshot).await
    }

    pub async fn clear_edit_snapshot(&self) -> Result<(), DatabaseError> {
        self.store.delete(StorageKey::EditOrganization).await?;
        Ok(())
    }

    // ── Setup progress ──────────────────────────────────────────────

    pub async fn load_setup_progress(&self) -> Result<Option<SetupProgress>, DatabaseError> {
        self.load_json(StorageKey::SetupOrganization).await
    }

    pub async fn record_setup_progress(
        &self,
        progress: &SetupProgress,
    ) -> Result<(), DatabaseError> {
        self.save_json(StorageKey::SetupOrganization, progress).await
    }

    pub async fn clear_setup_progress(&self) -> Result<(), DatabaseError> {
        self.store.delete(StorageKey::SetupOrganization).await?;
        Ok(())
    }

    // ── Selected organization ───────────────────────────────────────

    pub async fn select_organization(
        &self,
        record: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        self.save_json(StorageKey::SelectedOrganization, record).await
    }

    pub async fn selected_organization(
        &self,
    ) -> Result<Option<serde_json::Value>, DatabaseError> {
        self.load_json(StorageKey::SelectedOrganization).await
    }

    // ── Fallback list ───────────────────────────────────────────────

    /// The stored fallback list, empty when missing or malformed.
    pub async fn load_local_list(&self) -> Result<Vec<OrganizationSummary>, DatabaseError> {
        Ok(self
            .load_json(StorageKey::Organizations)
            .await?
            .unwrap_or_default())
    }

    /// Append a summary, or replace the entry with the same merchant id when
    /// editing. A replaced entry keeps its `id`. Last write wins; there is no
    /// cross-process locking.
    pub async fn save_summary(
        &self,
        summary: OrganizationSummary,
        is_edit_mode: bool,
    ) -> Result<SaveOutcome, DatabaseError> {
        let mut list = self.load_local_list().await?;

        let existing = is_edit_mode
            .then(|| list.iter().position(|s| s.merchant_id == summary.merchant_id))
            .flatten();

        let outcome = match existing {
            Some(index) => {
                let id = std::mem::take(&mut list[index].id);
                list[index] = OrganizationSummary { id, ..summary };
                SaveOutcome::Replaced
            }
            None => {
                list.push(summary);
                SaveOutcome::Appended
            }
        };

        self.replace_local_list(&list).await?;
        info!(entries = list.len(), ?outcome, "Saved organization summary");
        Ok(outcome)
    }

    pub async fn replace_local_list(
        &self,
        list: &[OrganizationSummary],
    ) -> Result<(), DatabaseError> {
        self.save_json(StorageKey::Organizations, &list).await
    }

    pub async fn remove_local_list(&self) -> Result<(), DatabaseError> {
        self.store.delete(StorageKey::Organizations).await?;
        Ok(())
    }
}
