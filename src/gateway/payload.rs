//! Request bodies for each step: a `request_data` JSON part plus file parts.

use serde_json::{Value, json};

use crate::wizard::fields::{Attachment, FieldBag, is_blank, parts};
use crate::wizard::Step;

/// Name of the JSON part every step sends.
pub const REQUEST_DATA_PART: &str = "request_data";

/// A file to send under a multipart field name.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: &'static str,
    pub attachment: Attachment,
}

/// Everything one step submission sends.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPayload {
    pub step: Step,
    pub request_data: Value,
    pub files: Vec<FilePart>,
}

impl StepPayload {
    /// Field names of the file parts, in send order.
    pub fn file_fields(&self) -> Vec<&'static str> {
        self.files.iter().map(|f| f.field).collect()
    }
}

/// Serialize the slice of `fields` a step owns.
///
/// File ids are sent as null placeholders; the backend fills them from the
/// uploaded parts. Blank contact rows are dropped.
pub fn build_payload(step: Step, organization_id: &str, fields: &FieldBag) -> StepPayload {
    let organization_id = organization_id.trim();
    let mut files = Vec::new();

    let request_data = match step {
        Step::BasicInfo => {
            let basic = &fields.basic_info;
            push_single(&mut files, parts::REGISTRATION_CERTIFICATE, &basic.registration_certificate);
            push_single(&mut files, parts::PAN_TAX_ID, &basic.pan_tax_id);
            push_single(&mut files, parts::GST_VAT_CERTIFICATE, &basic.gst_vat_certificate);
            push_single(&mut files, parts::MOA_AOA, &basic.moa_aoa);
            push_many(
                &mut files,
                parts::AUTHORIZED_SIGNATORY_ID_PROOF,
                &basic.authorized_signatory_id_proofs,
            );
            json!({
                "organization_id": organization_id,
                "legal_entity_name": basic.legal_entity_name.trim(),
                "registered_address": basic.registered_address.trim(),
                "business_type": basic.business_type.map(|b| b.as_str()),
                "registration_certificate_file_id": null,
                "pan_tax_id_file_id": null,
                "gst_vat_certificate_file_id": null,
                "moa_aoa_file_id": null,
                "authorized_signatory_id_proof_file_ids": null,
            })
        }
        Step::Compliance => {
            let compliance = &fields.compliance;
            push_many(&mut files, parts::REGULATORY_LICENSES, &compliance.regulatory_licenses);
            push_single(&mut files, parts::DATA_PRIVACY_POLICY, &compliance.data_privacy_policy);
            push_single(
                &mut files,
                parts::INFORMATION_SECURITY_POLICY,
                &compliance.information_security_policy,
            );
            json!({
                "organization_id": organization_id,
                "data_privacy_policy_url": optional_text(&compliance.data_privacy_policy_url),
                "regulatory_licenses_file_ids": null,
                "data_privacy_policy_file_id": null,
                "information_security_policy_file_id": null,
            })
        }
        Step::Technical => {
            let technical = &fields.technical;
            push_single(
                &mut files,
                parts::NETWORK_ARCHITECTURE_DIAGRAM,
                &technical.network_architecture_diagram,
            );
            push_single(
                &mut files,
                parts::API_INTEGRATION_DETAILS,
                &technical.api_integration_details,
            );
            push_single(
                &mut files,
                parts::SECURITY_CERTIFICATIONS,
                &technical.security_certifications,
            );
            push_single(
                &mut files,
                parts::PENETRATION_TEST_REPORT,
                &technical.penetration_test_report,
            );
            let infra = &technical.infrastructure;
            let ips: Vec<&str> = infra
                .ip_whitelisting
                .as_slice()
                .iter()
                .map(|ip| ip.trim())
                .filter(|ip| !ip.is_empty())
                .collect();
            json!({
                "organization_id": organization_id,
                "infrastructure_details": {
                    "cloud_provider": infra.cloud_provider.trim(),
                    "server_region": infra.server_region.trim(),
                    "ip_whitelisting": ips,
                },
                "technical_contacts": technical.technical_contacts.non_blank(),
                "network_architecture_diagram_file_id": null,
                "api_integration_details_file_id": null,
                "security_certifications_file_id": null,
                "penetration_test_report_file_id": null,
            })
        }
        Step::UseCase => {
            let use_case = &fields.use_case;
            push_single(&mut files, parts::BUSINESS_USE_CASE, &use_case.business_use_case);
            push_single(&mut files, parts::DATA_FLOW_DIAGRAM, &use_case.data_flow_diagram);
            push_single(&mut files, parts::VOLUME_ESTIMATES, &use_case.volume_estimates);
            push_single(&mut files, parts::CONSENT_MECHANISM, &use_case.consent_mechanism);
            json!({
                "organization_id": organization_id,
                "access_roles_matrix": use_case.access_roles_matrix.non_blank(),
                "business_use_case_file_id": null,
                "data_flow_diagram_file_id": null,
                "volume_estimates_file_id": null,
                "consent_mechanism_file_id": null,
            })
        }
        Step::Authorization => {
            let authorization = &fields.authorization;
            push_single(&mut files, parts::BOARD_RESOLUTION, &authorization.board_resolution);
            push_single(
                &mut files,
                parts::AUTHORIZED_SIGNATORY_LETTER,
                &authorization.authorized_signatory_letter,
            );
            json!({
                "organization_id": organization_id,
                "escalation_contacts": authorization.escalation_contacts.non_blank(),
                "board_resolution_file_id": null,
                "authorized_signatory_letter_file_id": null,
            })
        }
    };

    StepPayload {
        step,
        request_data,
        files,
    }
}

fn push_single(files: &mut Vec<FilePart>, field: &'static str, slot: &Option<Attachment>) {
    if let Some(attachment) = slot {
        files.push(FilePart {
            field,
            attachment: attachment.clone(),
        });
    }
}

fn push_many(files: &mut Vec<FilePart>, field: &'static str, attachments: &[Attachment]) {
    files.extend(attachments.iter().map(|attachment| FilePart {
        field,
        attachment: attachment.clone(),
    }));
}

fn optional_text(value: &str) -> Option<&str> {
    (!is_blank(value)).then(|| value.trim())
}
