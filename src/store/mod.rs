//! Client-side key-value storage for session and local state.
//!
//! Two scopes exist: `Session` holds per-flow blobs (edit targets, the
//! organization being set up) and is dropped by `clear_session`;
//! `Local` survives restarts and holds the fallback organization list.
//! Every key the application uses is a [`StorageKey`] variant.

pub mod libsql_backend;
pub mod migrations;

pub use libsql_backend::LibSqlStore;

use async_trait::async_trait;

use crate::error::DatabaseError;

/// Lifetime of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageScope {
    Session,
    Local,
}

impl StorageScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Local => "local",
        }
    }
}

/// Every persisted key, with its fixed scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    EditOrganization,
    EditRole,
    EditUser,
    EditVault,
    EditWorkspace,
    SetupOrganization,
    SelectedOrganization,
    /// Fallback organization list merged against the API list.
    Organizations,
}

impl StorageKey {
    pub fn name(&self) -> &'static str {
        match self {
            Self::EditOrganization => "editOrganization",
            Self::EditRole => "editRole",
            Self::EditUser => "editUser",
            Self::EditVault => "editVault",
            Self::EditWorkspace => "editWorkspace",
            Self::SetupOrganization => "setupOrganization",
            Self::SelectedOrganization => "selectedOrganization",
            Self::Organizations => "organizations",
        }
    }

    pub fn scope(&self) -> StorageScope {
        match self {
            Self::Organizations => StorageScope::Local,
            _ => StorageScope::Session,
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scope().as_str(), self.name())
    }
}

/// Backend-agnostic string store. Values are opaque; callers own the encoding.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value for a key.
    async fn get(&self, key: StorageKey) -> Result<Option<String>, DatabaseError>;

    /// Write (upsert) a raw value. Last write wins.
    async fn set(&self, key: StorageKey, value: &str) -> Result<(), DatabaseError>;

    /// Delete a key. Returns whether it existed.
    async fn delete(&self, key: StorageKey) -> Result<bool, DatabaseError>;

    /// Drop every value in a scope. Returns the number removed.
    async fn clear_scope(&self, scope: StorageScope) -> Result<usize, DatabaseError>;
}
