//! Merge of the authoritative API list with the local fallback list.

use serde::Serialize;

use crate::persistence::OrganizationSummary;
use crate::wizard::org_id::is_well_formed;

use super::OrganizationRecord;

/// Where a merged entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    Api,
    Local,
}

/// One row of the organization list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedOrganization {
    pub source: EntrySource,
    pub name: String,
    pub email: String,
    pub organization_id: String,
    pub status: String,
}

/// Result of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// API entries in API order, then surviving local entries in stored order.
    pub merged: Vec<MergedOrganization>,
    /// Local entries that were kept, for writing back.
    pub surviving_local: Vec<OrganizationSummary>,
    /// How many local entries were dropped as duplicates or orphans.
    pub dropped: usize,
}

/// Merge `api` with `local`.
///
/// A local entry is dropped when any of name, email, or organization id
/// matches an API entry (trimmed, case-insensitive, blanks never match), or
/// when it has neither a name nor an `ORG_`-prefixed id.
pub fn merge(api: &[OrganizationRecord], local: &[OrganizationSummary]) -> MergeOutcome {
    let api_keys: Vec<[String; 3]> = api
        .iter()
        .map(|r| {
            [
                normalize(r.display_name()),
                normalize(r.email.as_deref().unwrap_or_default()),
                normalize(r.organization_id.as_deref().unwrap_or_default()),
            ]
        })
        .collect();

    let mut outcome = MergeOutcome {
        merged: api.iter().map(MergedOrganization::from).collect(),
        ..MergeOutcome::default()
    };

    for entry in local {
        if is_orphan(entry) || is_duplicate(entry, &api_keys) {
            outcome.dropped += 1;
            continue;
        }
        outcome.merged.push(MergedOrganization::from(entry));
        outcome.surviving_local.push(entry.clone());
    }

    outcome
}

fn is_orphan(entry: &OrganizationSummary) -> bool {
    entry.name.trim().is_empty() && !is_well_formed(entry.merchant_id.trim())
}

fn is_duplicate(entry: &OrganizationSummary, api_keys: &[[String; 3]]) -> bool {
    let local = [
        normalize(&entry.name),
        normalize(&entry.email),
        normalize(&entry.merchant_id),
    ];
    api_keys.iter().any(|api| {
        api.iter()
            .zip(local.iter())
            .any(|(a, l)| !a.is_empty() && a == l)
    })
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

impl From<&OrganizationRecord> for MergedOrganization {
    fn from(record: &OrganizationRecord) -> Self {
        Self {
            source: EntrySource::Api,
            name: record.display_name().to_string(),
            email: record.email.clone().unwrap_or_default(),
            organization_id: record.organization_id.clone().unwrap_or_default(),
            status: record.status.clone().unwrap_or_default(),
        }
    }
}

impl From<&OrganizationSummary> for MergedOrganization {
    fn from(summary: &OrganizationSummary) -> Self {
        Self {
            source: EntrySource::Local,
            name: summary.name.clone(),
            email: summary.email.clone(),
            organization_id: summary.merchant_id.clone(),
            status: summary.product_status.clone(),
        }
    }
}
