//! Organization directory: the list view and detail lookups.

pub mod loader;
pub mod merge;

pub use loader::{ListLoader, ListView, LoadTicket};
pub use merge::{EntrySource, MergeOutcome, MergedOrganization, merge};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::DirectoryError;
use crate::persistence::EditSnapshot;
use crate::wizard::fields::{
    AccessRoleRow, AccessRolesMatrix, ContactRow, EscalationContacts, IpWhitelist,
    TechnicalContacts,
};

/// One entry of `GET /organizations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    /// Backend primary key; numeric or string depending on the deployment.
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default, alias = "name")]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl OrganizationRecord {
    pub fn display_name(&self) -> &str {
        self.organization_name.as_deref().unwrap_or_default()
    }
}

/// Read access to the backend's organization records.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// `GET /organizations`.
    async fn list_organizations(&self) -> Result<Vec<OrganizationRecord>, DirectoryError>;

    /// `GET /organizations/{organization_id}`, the full nested record.
    async fn get_organization(&self, organization_id: &str) -> Result<Value, DirectoryError>;
}

const ORGANIZATIONS_PATH: &str = "/organizations";

/// `reqwest`-backed directory client.
pub struct HttpDirectoryClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpDirectoryClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    async fn get_json(&self, path: &str) -> Result<(u16, Value), DirectoryError> {
        let url = self.config.endpoint_url(path);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        debug!(%url, "Fetching");
        let response = request
            .send()
            .await
            .map_err(|e| DirectoryError::RequestFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DirectoryError::RequestFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok((status.as_u16(), Value::Null));
        }
        if !status.is_success() {
            return Err(DirectoryError::RequestFailed {
                url,
                reason: format!("HTTP {status}"),
            });
        }
        let json = serde_json::from_str(&body).map_err(|e| DirectoryError::InvalidResponse {
            url,
            reason: e.to_string(),
        })?;
        Ok((status.as_u16(), json))
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn list_organizations(&self) -> Result<Vec<OrganizationRecord>, DirectoryError> {
        let (status, body) = self.get_json(ORGANIZATIONS_PATH).await?;
        if status == 404 {
            return Ok(Vec::new());
        }
        parse_organization_list(body).map_err(|reason| DirectoryError::InvalidResponse {
            url: self.config.endpoint_url(ORGANIZATIONS_PATH),
            reason,
        })
    }

    async fn get_organization(&self, organization_id: &str) -> Result<Value, DirectoryError> {
        let (status, body) = self
            .get_json(&format!("{ORGANIZATIONS_PATH}/{organization_id}"))
            .await?;
        if status == 404 {
            return Err(DirectoryError::NotFound(organization_id.to_string()));
        }
        Ok(unwrap_data(body))
    }
}

/// Accept a bare array, `{"data": [...]}`, or `{"organizations": [...]}`.
pub fn parse_organization_list(body: Value) -> Result<Vec<OrganizationRecord>, String> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data").or_else(|| obj.remove("organizations")) {
            Some(Value::Array(items)) => items,
            _ => return Err("expected an array of organizations".to_string()),
        },
        _ => return Err("expected an array of organizations".to_string()),
    };
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(|e| e.to_string()))
        .collect()
}

fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut obj) if obj.get("data").is_some_and(Value::is_object) => {
            obj.remove("data").unwrap_or_default()
        }
        other => other,
    }
}

/// Map a full nested organization record back to an edit snapshot.
///
/// Unknown or missing sections leave the corresponding groups empty.
pub fn snapshot_from_record(record: &Value) -> EditSnapshot {
    let mut snapshot = EditSnapshot {
        organization_id: text(record, "organization_id"),
        ..EditSnapshot::default()
    };

    let basic = section(record, &["basic_info", "basicInfo"]);
    if let Some(basic) = basic {
        let info = &mut snapshot.basic_info;
        info.legal_entity_name = text(basic, "legal_entity_name").unwrap_or_default();
        info.registered_address = text(basic, "registered_address").unwrap_or_default();
        info.business_type = text(basic, "business_type").and_then(|b| b.parse().ok());
    }

    if let Some(compliance) = section(record, &["compliance"]) {
        snapshot.compliance.data_privacy_policy_url =
            text(compliance, "data_privacy_policy_url").unwrap_or_default();
    }

    if let Some(technical) = section(record, &["technical", "technical_info"]) {
        let details = technical
            .get("infrastructure_details")
            .unwrap_or(technical);
        let infra = &mut snapshot.technical.infrastructure;
        infra.cloud_provider = text(details, "cloud_provider").unwrap_or_default();
        infra.server_region = text(details, "server_region").unwrap_or_default();
        infra.ip_whitelisting = IpWhitelist::from_raw(string_list(details, "ip_whitelisting"));
        snapshot.technical.technical_contacts =
            TechnicalContacts::from_rows(rows::<ContactRow>(technical, "technical_contacts"));
    }

    if let Some(use_case) = section(record, &["use_case", "usecase"]) {
        snapshot.use_case.access_roles_matrix =
            AccessRolesMatrix::from_rows(rows::<AccessRoleRow>(use_case, "access_roles_matrix"));
    }

    if let Some(authorization) = section(record, &["authorization"]) {
        snapshot.authorization.escalation_contacts = EscalationContacts::from_rows(
            rows::<ContactRow>(authorization, "escalation_contacts"),
        );
    }

    snapshot
}

fn section<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|k| record.get(*k))
        .filter(|v| v.is_object())
}

fn text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        // Some deployments store the whitelist as a comma-separated string.
        Some(Value::String(s)) => s
            .split(',')
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn rows<T: serde::de::DeserializeOwned>(value: &Value, key: &str) -> Vec<T> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}
