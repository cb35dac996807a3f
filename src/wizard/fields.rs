//! Form field store. Every value collected across the five wizard steps.
//!
//! All groups derive serde with `#[serde(default)]` so a partial edit
//! snapshot lands on empty defaults. File handles are never serialized.

use std::path::Path;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Maximum number of whitelisted IP addresses.
pub const MAX_WHITELISTED_IPS: usize = 3;

/// Technical contacts: at least one row in the form, at most ten.
pub type TechnicalContacts = ContactList<ContactRow, 1, 10>;
/// Access-roles matrix: the form only ever shows one active row.
pub type AccessRolesMatrix = ContactList<AccessRoleRow, 1, 1>;
/// Escalation contacts: never fewer than one row, at most ten.
pub type EscalationContacts = ContactList<ContactRow, 1, 10>;

/// Multipart part names, one per upload slot.
pub mod parts {
    pub const REGISTRATION_CERTIFICATE: &str = "registration_certificate";
    pub const PAN_TAX_ID: &str = "pan_tax_id";
    pub const GST_VAT_CERTIFICATE: &str = "gst_vat_certificate";
    pub const MOA_AOA: &str = "moa_aoa";
    pub const AUTHORIZED_SIGNATORY_ID_PROOF: &str = "authorized_signatory_id_proof";

    pub const REGULATORY_LICENSES: &str = "regulatory_licenses";
    pub const DATA_PRIVACY_POLICY: &str = "data_privacy_policy";
    pub const INFORMATION_SECURITY_POLICY: &str = "information_security_policy";

    pub const NETWORK_ARCHITECTURE_DIAGRAM: &str = "network_architecture_diagram";
    pub const API_INTEGRATION_DETAILS: &str = "api_integration_details";
    pub const SECURITY_CERTIFICATIONS: &str = "security_certifications";
    pub const PENETRATION_TEST_REPORT: &str = "penetration_test_report";

    pub const BUSINESS_USE_CASE: &str = "business_use_case";
    pub const DATA_FLOW_DIAGRAM: &str = "data_flow_diagram";
    pub const VOLUME_ESTIMATES: &str = "volume_estimates";
    pub const CONSENT_MECHANISM: &str = "consent_mechanism";

    pub const BOARD_RESOLUTION: &str = "board_resolution";
    pub const AUTHORIZED_SIGNATORY_LETTER: &str = "authorized_signatory_letter";
}

// ── Attachments ─────────────────────────────────────────────────────

/// A file picked for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read a file from disk.
    pub async fn from_path(path: &Path) -> Result<Self, GatewayError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| GatewayError::Attachment {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

// ── Repeated rows ───────────────────────────────────────────────────

/// A repeated form row that may be left entirely blank.
pub trait Row: Default + Clone {
    /// True when every field is empty or whitespace.
    fn is_blank(&self) -> bool;
}

/// A person row used by technical and escalation contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactRow {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub designation: String,
}

impl Row for ContactRow {
    fn is_blank(&self) -> bool {
        [&self.name, &self.email, &self.phone, &self.designation]
            .iter()
            .all(|v| v.trim().is_empty())
    }
}

/// One entry of the access-roles matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessRoleRow {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
}

impl Row for AccessRoleRow {
    fn is_blank(&self) -> bool {
        [&self.name, &self.email, &self.phone, &self.role]
            .iter()
            .all(|v| v.trim().is_empty())
    }
}

/// A list of rows bounded by a floor and a cap.
///
/// The list never holds fewer than `FLOOR` rows: removing a row at the floor
/// blanks it instead. Pushing beyond `CAP` is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactList<T, const FLOOR: usize, const CAP: usize> {
    rows: Vec<T>,
}

impl<T: Row, const FLOOR: usize, const CAP: usize> ContactList<T, FLOOR, CAP> {
    /// Build from existing rows, padding to the floor and truncating at the cap.
    pub fn from_rows(mut rows: Vec<T>) -> Self {
        rows.truncate(CAP);
        while rows.len() < FLOOR {
            rows.push(T::default());
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= CAP
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.rows.get_mut(index)
    }

    /// Append a row. Returns false (list unchanged) when already at the cap.
    pub fn push(&mut self, row: T) -> bool {
        if self.is_full() {
            return false;
        }
        self.rows.push(row);
        true
    }

    /// Append a blank row.
    pub fn push_blank(&mut self) -> bool {
        self.push(T::default())
    }

    /// Remove a row, preserving the order of the others.
    ///
    /// At the floor the targeted row is reset to blank instead. Returns false
    /// for an out-of-range index.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        if self.rows.len() > FLOOR {
            self.rows.remove(index);
        } else {
            self.rows[index] = T::default();
        }
        true
    }

    /// Rows with at least one populated field, in order.
    pub fn non_blank(&self) -> Vec<T> {
        self.rows.iter().filter(|r| !r.is_blank()).cloned().collect()
    }

    pub fn first(&self) -> Option<&T> {
        self.rows.first()
    }
}

impl<T: Row, const FLOOR: usize, const CAP: usize> Default for ContactList<T, FLOOR, CAP> {
    fn default() -> Self {
        Self::from_rows(Vec::new())
    }
}

impl<T: Row + Serialize, const FLOOR: usize, const CAP: usize> Serialize
    for ContactList<T, FLOOR, CAP>
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}

impl<'de, T: Row + Deserialize<'de>, const FLOOR: usize, const CAP: usize> Deserialize<'de>
    for ContactList<T, FLOOR, CAP>
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<T>::deserialize(deserializer)?;
        Ok(Self::from_rows(rows))
    }
}

// ── IP whitelist ────────────────────────────────────────────────────

/// Whitelisted IP addresses for the technical infrastructure record.
///
/// `add` keeps the list distinct and at most [`MAX_WHITELISTED_IPS`] long.
/// Data loaded from elsewhere is kept as-is so the gateway can reject it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IpWhitelist(Vec<String>);

impl IpWhitelist {
    /// Wrap entries without enforcing the cap.
    pub fn from_raw(entries: Vec<String>) -> Self {
        Self(entries)
    }

    /// Add an address. Returns whether the list changed.
    pub fn add(&mut self, ip: &str) -> bool {
        let ip = ip.trim();
        if ip.is_empty() || self.0.len() >= MAX_WHITELISTED_IPS || self.contains(ip) {
            return false;
        }
        self.0.push(ip.to_string());
        true
    }

    pub fn remove(&mut self, ip: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != ip.trim());
        self.0.len() != before
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.0.iter().any(|existing| existing == ip)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Business type ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    SoleProprietorship,
    Partnership,
    PrivateLimited,
    PublicLimited,
    Llp,
    Trust,
    Ngo,
    Government,
    #[serde(other)]
    Other,
}

impl BusinessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoleProprietorship => "sole_proprietorship",
            Self::Partnership => "partnership",
            Self::PrivateLimited => "private_limited",
            Self::PublicLimited => "public_limited",
            Self::Llp => "llp",
            Self::Trust => "trust",
            Self::Ngo => "ngo",
            Self::Government => "government",
            Self::Other => "other",
        }
    }
}

impl FromStr for BusinessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "sole_proprietorship" => Ok(Self::SoleProprietorship),
            "partnership" => Ok(Self::Partnership),
            "private_limited" => Ok(Self::PrivateLimited),
            "public_limited" => Ok(Self::PublicLimited),
            "llp" => Ok(Self::Llp),
            "trust" => Ok(Self::Trust),
            "ngo" => Ok(Self::Ngo),
            "government" => Ok(Self::Government),
            "other" => Ok(Self::Other),
            _ => Err(format!("unknown business type: {s}")),
        }
    }
}

impl std::fmt::Display for BusinessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Step groups ─────────────────────────────────────────────────────

/// Step 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicInfo {
    pub legal_entity_name: String,
    pub registered_address: String,
    pub business_type: Option<BusinessType>,
    #[serde(skip)]
    pub registration_certificate: Option<Attachment>,
    #[serde(skip)]
    pub pan_tax_id: Option<Attachment>,
    #[serde(skip)]
    pub gst_vat_certificate: Option<Attachment>,
    #[serde(skip)]
    pub moa_aoa: Option<Attachment>,
    #[serde(skip)]
    pub authorized_signatory_id_proofs: Vec<Attachment>,
}

/// Step 2.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Compliance {
    /// Website alternative to the data-privacy PDF.
    pub data_privacy_policy_url: String,
    #[serde(skip)]
    pub regulatory_licenses: Vec<Attachment>,
    #[serde(skip)]
    pub data_privacy_policy: Option<Attachment>,
    #[serde(skip)]
    pub information_security_policy: Option<Attachment>,
}

/// Hosting details captured on step 3.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Infrastructure {
    pub cloud_provider: String,
    pub server_region: String,
    pub ip_whitelisting: IpWhitelist,
}

/// Step 3.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Technical {
    pub infrastructure: Infrastructure,
    pub technical_contacts: TechnicalContacts,
    #[serde(skip)]
    pub network_architecture_diagram: Option<Attachment>,
    #[serde(skip)]
    pub api_integration_details: Option<Attachment>,
    #[serde(skip)]
    pub security_certifications: Option<Attachment>,
    #[serde(skip)]
    pub penetration_test_report: Option<Attachment>,
}

/// Step 4.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UseCase {
    pub access_roles_matrix: AccessRolesMatrix,
    #[serde(skip)]
    pub business_use_case: Option<Attachment>,
    #[serde(skip)]
    pub data_flow_diagram: Option<Attachment>,
    #[serde(skip)]
    pub volume_estimates: Option<Attachment>,
    #[serde(skip)]
    pub consent_mechanism: Option<Attachment>,
}

/// Step 5.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Authorization {
    pub escalation_contacts: EscalationContacts,
    #[serde(skip)]
    pub board_resolution: Option<Attachment>,
    #[serde(skip)]
    pub authorized_signatory_letter: Option<Attachment>,
}

/// Every value collected by the wizard. All keys exist from the start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldBag {
    pub basic_info: BasicInfo,
    pub compliance: Compliance,
    pub technical: Technical,
    pub use_case: UseCase,
    pub authorization: Authorization,
}

impl FieldBag {
    /// Put an attachment into the slot named by its multipart part name.
    ///
    /// Single-file slots are replaced, multi-file slots are appended to.
    /// Returns false for an unknown part name.
    pub fn attach(&mut self, part: &str, attachment: Attachment) -> bool {
        let slot = match part {
            parts::REGISTRATION_CERTIFICATE => &mut self.basic_info.registration_certificate,
            parts::PAN_TAX_ID => &mut self.basic_info.pan_tax_id,
            parts::GST_VAT_CERTIFICATE => &mut self.basic_info.gst_vat_certificate,
            parts::MOA_AOA => &mut self.basic_info.moa_aoa,
            parts::DATA_PRIVACY_POLICY => &mut self.compliance.data_privacy_policy,
            parts::INFORMATION_SECURITY_POLICY => {
                &mut self.compliance.information_security_policy
            }
            parts::NETWORK_ARCHITECTURE_DIAGRAM => {
                &mut self.technical.network_architecture_diagram
            }
            parts::API_INTEGRATION_DETAILS => &mut self.technical.api_integration_details,
            parts::SECURITY_CERTIFICATIONS => &mut self.technical.security_certifications,
            parts::PENETRATION_TEST_REPORT => &mut self.technical.penetration_test_report,
            parts::BUSINESS_USE_CASE => &mut self.use_case.business_use_case,
            parts::DATA_FLOW_DIAGRAM => &mut self.use_case.data_flow_diagram,
            parts::VOLUME_ESTIMATES => &mut self.use_case.volume_estimates,
            parts::CONSENT_MECHANISM => &mut self.use_case.consent_mechanism,
            parts::BOARD_RESOLUTION => &mut self.authorization.board_resolution,
            parts::AUTHORIZED_SIGNATORY_LETTER => {
                &mut self.authorization.authorized_signatory_letter
            }
            parts::AUTHORIZED_SIGNATORY_ID_PROOF => {
                self.basic_info.authorized_signatory_id_proofs.push(attachment);
                return true;
            }
            parts::REGULATORY_LICENSES => {
                self.compliance.regulatory_licenses.push(attachment);
                return true;
            }
            _ => return false,
        };
        *slot = Some(attachment);
        true
    }

    /// Email of the first access-roles-matrix row, used in the list summary.
    pub fn primary_contact_email(&self) -> String {
        self.use_case
            .access_roles_matrix
            .first()
            .map(|r| r.email.trim().to_string())
            .unwrap_or_default()
    }
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str) -> ContactRow {
        ContactRow {
            name: name.to_string(),
            ..ContactRow::default()
        }
    }

    #[test]
    fn contact_lists_start_with_one_blank_row() {
        let bag = FieldBag::default();
        assert_eq!(bag.technical.technical_contacts.len(), 1);
        assert_eq!(bag.authorization.escalation_contacts.len(), 1);
        assert!(bag.authorization.escalation_contacts.rows()[0].is_blank());
    }

    #[test]
    fn removing_sole_row_leaves_one_blank_row() {
        let mut list = EscalationContacts::from_rows(vec![ContactRow {
            name: "Asha".into(),
            email: "asha@acme.io".into(),
            phone: "555".into(),
            designation: "CTO".into(),
        }]);
        assert!(list.remove(0));
        assert_eq!(list.len(), 1);
        assert!(list.rows()[0].is_blank());
    }

    #[test]
    fn removing_middle_row_preserves_order() {
        let mut list =
            EscalationContacts::from_rows(vec![contact("a"), contact("b"), contact("c")]);
        assert!(list.remove(1));
        let names: Vec<_> = list.rows().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut list = EscalationContacts::from_rows(vec![contact("a")]);
        assert!(!list.remove(3));
        assert_eq!(list.rows()[0].name, "a");
    }

    #[test]
    fn push_stops_at_cap() {
        let mut list = TechnicalContacts::default();
        for _ in 0..9 {
            assert!(list.push_blank());
        }
        assert_eq!(list.len(), 10);
        assert!(!list.push_blank());
        assert_eq!(list.len(), 10);

        let mut matrix = AccessRolesMatrix::default();
        assert!(!matrix.push_blank());
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn non_blank_filters_whitespace_rows() {
        let list = EscalationContacts::from_rows(vec![
            contact("a"),
            ContactRow {
                name: "  ".into(),
                phone: "\t".into(),
                ..ContactRow::default()
            },
            contact("b"),
        ]);
        let kept: Vec<_> = list.non_blank().into_iter().map(|r| r.name).collect();
        assert_eq!(kept, ["a", "b"]);
    }

    #[test]
    fn deserialize_pads_and_truncates() {
        let empty: EscalationContacts = serde_json::from_str("[]").unwrap();
        assert_eq!(empty.len(), 1);

        let many: AccessRolesMatrix =
            serde_json::from_str(r#"[{"name":"a"},{"name":"b"}]"#).unwrap();
        assert_eq!(many.len(), 1);
        assert_eq!(many.rows()[0].name, "a");
    }

    #[test]
    fn fourth_ip_is_refused() {
        let mut ips = IpWhitelist::default();
        assert!(ips.add("10.0.0.1"));
        assert!(ips.add("10.0.0.2"));
        assert!(ips.add("10.0.0.3"));
        assert!(!ips.add("10.0.0.4"));
        assert_eq!(ips.len(), 3);
        assert!(!ips.contains("10.0.0.4"));
    }

    #[test]
    fn duplicate_and_blank_ips_are_refused() {
        let mut ips = IpWhitelist::default();
        assert!(ips.add("10.0.0.1"));
        assert!(!ips.add(" 10.0.0.1 "));
        assert!(!ips.add("   "));
        assert_eq!(ips.as_slice(), ["10.0.0.1"]);
    }

    #[test]
    fn remove_ip() {
        let mut ips = IpWhitelist::from_raw(vec!["1.1.1.1".into(), "2.2.2.2".into()]);
        assert!(ips.remove("1.1.1.1"));
        assert!(!ips.remove("9.9.9.9"));
        assert_eq!(ips.as_slice(), ["2.2.2.2"]);
    }

    #[test]
    fn business_type_parsing() {
        assert_eq!(
            "Private Limited".parse::<BusinessType>().unwrap(),
            BusinessType::PrivateLimited
        );
        assert_eq!("llp".parse::<BusinessType>().unwrap(), BusinessType::Llp);
        assert!("corp".parse::<BusinessType>().is_err());

        let unknown: BusinessType = serde_json::from_str("\"cooperative\"").unwrap();
        assert_eq!(unknown, BusinessType::Other);
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(Attachment::new("a.PDF", vec![1]).content_type, "application/pdf");
        assert_eq!(Attachment::new("scan.jpeg", vec![1]).content_type, "image/jpeg");
        assert_eq!(
            Attachment::new("blob", vec![1]).content_type,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn attachment_from_missing_path_errors() {
        let err = Attachment::from_path(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Attachment { .. }));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let bag: FieldBag = serde_json::from_str(
            r#"{"basic_info": {"legal_entity_name": "Acme"},
                "technical": {"infrastructure": {"ip_whitelisting": ["1.2.3.4"]}}}"#,
        )
        .unwrap();
        assert_eq!(bag.basic_info.legal_entity_name, "Acme");
        assert!(bag.basic_info.registered_address.is_empty());
        assert_eq!(bag.technical.infrastructure.ip_whitelisting.len(), 1);
        assert_eq!(bag.authorization.escalation_contacts.len(), 1);
    }

    #[test]
    fn attach_by_part_name() {
        let mut bag = FieldBag::default();
        assert!(bag.attach(parts::PAN_TAX_ID, Attachment::new("pan.pdf", vec![1])));
        assert!(bag.attach(parts::PAN_TAX_ID, Attachment::new("pan2.pdf", vec![2])));
        assert_eq!(
            bag.basic_info.pan_tax_id.as_ref().unwrap().file_name,
            "pan2.pdf"
        );

        assert!(bag.attach(parts::REGULATORY_LICENSES, Attachment::new("a.pdf", vec![1])));
        assert!(bag.attach(parts::REGULATORY_LICENSES, Attachment::new("b.pdf", vec![1])));
        assert_eq!(bag.compliance.regulatory_licenses.len(), 2);

        assert!(!bag.attach("selfie", Attachment::new("me.png", vec![1])));
    }

    #[test]
    fn primary_contact_email_is_trimmed() {
        let mut bag = FieldBag::default();
        bag.use_case.access_roles_matrix.get_mut(0).unwrap().email = " ops@acme.io ".into();
        assert_eq!(bag.primary_contact_email(), "ops@acme.io");
    }
}
