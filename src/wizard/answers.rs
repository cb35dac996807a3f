//! Answers file: a JSON document that fills every step of the wizard.
//!
//! ```json
//! {
//!   "basic_info": { "legal_entity_name": "Acme", ... },
//!   "technical": { "infrastructure": { "ip_whitelisting": ["10.0.0.1"] } },
//!   "attachments": {
//!     "information_security_policy": ["docs/isp.pdf"],
//!     "regulatory_licenses": ["docs/l1.pdf", "docs/l2.pdf"]
//!   }
//! }
//! ```
//!
//! Attachment keys are multipart part names. Relative paths resolve against
//! the answers file's directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ConfigError, Error, Result};

use super::fields::{Attachment, FieldBag};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Answers {
    #[serde(flatten)]
    pub fields: FieldBag,
    #[serde(default)]
    pub attachments: BTreeMap<String, Vec<PathBuf>>,
    /// Directory relative attachment paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Answers {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ConfigError::ParseError(format!("answers file: {e}")).into())
    }

    /// Read and parse an answers file.
    pub async fn read(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::from(ConfigError::Io(e)))?;
        let mut answers = Self::parse(&raw)?;
        answers.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(answers)
    }

    /// Read an answers file into a fresh field bag, attachments included.
    pub async fn load(path: &Path) -> Result<FieldBag> {
        let mut fields = FieldBag::default();
        Self::read(path).await?.apply_to(&mut fields).await?;
        Ok(fields)
    }

    /// Overlay these answers onto `fields`.
    ///
    /// Merged field by field: a value given in the file replaces the target's,
    /// fields left out keep what `fields` already holds. The listed files are
    /// then attached. Unknown part names are skipped with a warning.
    pub async fn apply_to(self, fields: &mut FieldBag) -> Result<()> {
        let given = self.fields;

        let basic = &mut fields.basic_info;
        set_if_given(&mut basic.legal_entity_name, given.basic_info.legal_entity_name);
        set_if_given(&mut basic.registered_address, given.basic_info.registered_address);
        set_if_given(&mut basic.business_type, given.basic_info.business_type);

        set_if_given(
            &mut fields.compliance.data_privacy_policy_url,
            given.compliance.data_privacy_policy_url,
        );

        let infra = &mut fields.technical.infrastructure;
        let given_infra = given.technical.infrastructure;
        set_if_given(&mut infra.cloud_provider, given_infra.cloud_provider);
        set_if_given(&mut infra.server_region, given_infra.server_region);
        set_if_given(&mut infra.ip_whitelisting, given_infra.ip_whitelisting);
        set_if_given(
            &mut fields.technical.technical_contacts,
            given.technical.technical_contacts,
        );

        set_if_given(
            &mut fields.use_case.access_roles_matrix,
            given.use_case.access_roles_matrix,
        );
        set_if_given(
            &mut fields.authorization.escalation_contacts,
            given.authorization.escalation_contacts,
        );

        for (part, paths) in self.attachments {
            for path in paths {
                let resolved = if path.is_absolute() {
                    path
                } else {
                    self.base_dir.join(path)
                };
                let attachment = Attachment::from_path(&resolved).await?;
                debug!(%part, path = %resolved.display(), bytes = attachment.len(), "Loaded attachment");
                if !fields.attach(&part, attachment) {
                    warn!(%part, "Unknown attachment part; skipping");
                }
            }
        }
        Ok(())
    }
}

fn set_if_given<T: Default + PartialEq>(target: &mut T, given: T) {
    if given != T::default() {
        *target = given;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::fields::parts;

    #[test]
    fn parses_fields_and_attachment_map() {
        let answers = Answers::parse(
            r#"{
                "basic_info": {"legal_entity_name": "Acme", "business_type": "llp"},
                "technical": {"infrastructure": {"ip_whitelisting": ["10.0.0.1"]}},
                "attachments": {"board_resolution": ["br.pdf"]}
            }"#,
        )
        .unwrap();
        assert_eq!(answers.fields.basic_info.legal_entity_name, "Acme");
        assert_eq!(
            answers.fields.technical.infrastructure.ip_whitelisting.as_slice(),
            ["10.0.0.1"]
        );
        assert_eq!(answers.attachments["board_resolution"], [PathBuf::from("br.pdf")]);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = Answers::parse("{not json").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError(_))));
    }

    #[tokio::test]
    async fn attachments_resolve_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("isp.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("l1.pdf"), b"a").unwrap();
        std::fs::write(dir.path().join("l2.pdf"), b"b").unwrap();
        let path = dir.path().join("answers.json");
        std::fs::write(
            &path,
            format!(
                r#"{{"attachments": {{
                    "{}": ["isp.pdf"],
                    "{}": ["l1.pdf", "l2.pdf"],
                    "not_a_part": ["isp.pdf"]
                }}}}"#,
                parts::INFORMATION_SECURITY_POLICY,
                parts::REGULATORY_LICENSES
            ),
        )
        .unwrap();

        let fields = Answers::load(&path).await.unwrap();
        let isp = fields.compliance.information_security_policy.unwrap();
        assert_eq!(isp.file_name, "isp.pdf");
        assert_eq!(isp.content_type, "application/pdf");
        assert_eq!(fields.compliance.regulatory_licenses.len(), 2);
    }

    #[tokio::test]
    async fn missing_attachment_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut answers =
            Answers::parse(r#"{"attachments": {"moa_aoa": ["gone.pdf"]}}"#).unwrap();
        answers.base_dir = dir.path().to_path_buf();
        let mut fields = FieldBag::default();
        assert!(answers.apply_to(&mut fields).await.is_err());
    }

    #[tokio::test]
    async fn partial_group_keeps_sibling_fields() {
        let mut fields = FieldBag::default();
        fields.technical.infrastructure.cloud_provider = "gcp".into();
        fields.technical.infrastructure.server_region = "asia-south1".into();
        fields.technical.technical_contacts.get_mut(0).unwrap().email = "cto@acme.io".into();
        fields.compliance.information_security_policy =
            Some(Attachment::new("isp.pdf", b"%PDF".to_vec()));

        let answers = Answers::parse(
            r#"{
                "technical": {"infrastructure": {"cloud_provider": "aws"}},
                "compliance": {"data_privacy_policy_url": "https://acme.io/privacy"}
            }"#,
        )
        .unwrap();
        answers.apply_to(&mut fields).await.unwrap();

        let infra = &fields.technical.infrastructure;
        assert_eq!(infra.cloud_provider, "aws");
        assert_eq!(infra.server_region, "asia-south1");
        assert_eq!(fields.technical.technical_contacts.rows()[0].email, "cto@acme.io");
        assert!(fields.compliance.information_security_policy.is_some());
    }

    #[tokio::test]
    async fn empty_groups_keep_existing_values() {
        let mut fields = FieldBag::default();
        fields.basic_info.legal_entity_name = "From Snapshot".into();
        fields.compliance.data_privacy_policy_url = "https://old.example".into();

        let answers = Answers::parse(
            r#"{"compliance": {"data_privacy_policy_url": "https://new.example"}}"#,
        )
        .unwrap();
        answers.apply_to(&mut fields).await.unwrap();

        assert_eq!(fields.basic_info.legal_entity_name, "From Snapshot");
        assert_eq!(
            fields.compliance.data_privacy_policy_url,
            "https://new.example"
        );
    }
}
