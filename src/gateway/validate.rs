//! Local validation run before any request is sent.
//!
//! Checks run in a fixed order and stop at the first failure, so the user
//! sees one message at a time.

use crate::error::GatewayError;
use crate::wizard::fields::{FieldBag, MAX_WHITELISTED_IPS, is_blank};
use crate::wizard::org_id::is_well_formed;
use crate::wizard::Step;

pub const LEGAL_ENTITY_NAME_REQUIRED: &str = "Legal entity name is required";
pub const REGISTERED_ADDRESS_REQUIRED: &str = "Registered address is required";
pub const BUSINESS_TYPE_REQUIRED: &str = "Business type is required";
pub const ORGANIZATION_ID_REQUIRED: &str = "Valid organization ID is required";
pub const SECURITY_POLICY_REQUIRED: &str = "Information Security Policy PDF is required";
pub const PRIVACY_POLICY_REQUIRED: &str = "Data Privacy Policy PDF or website link is required";
pub const CLOUD_PROVIDER_REQUIRED: &str = "Cloud provider is required";
pub const SERVER_REGION_REQUIRED: &str = "Server region is required";
pub const IP_REQUIRED: &str = "At least one IP address is required for whitelisting";
pub const IP_LIMIT_EXCEEDED: &str = "You can add up to 3 IP addresses only";

/// Validate the fields a step needs before it is submitted.
pub fn validate_step(
    step: Step,
    organization_id: &str,
    fields: &FieldBag,
) -> Result<(), GatewayError> {
    match step {
        Step::BasicInfo => {
            let basic = &fields.basic_info;
            require(!is_blank(&basic.legal_entity_name), LEGAL_ENTITY_NAME_REQUIRED)?;
            require(!is_blank(&basic.registered_address), REGISTERED_ADDRESS_REQUIRED)?;
            require(basic.business_type.is_some(), BUSINESS_TYPE_REQUIRED)?;
            require_organization_id(organization_id)
        }
        Step::Compliance => {
            require_organization_id(organization_id)?;
            let compliance = &fields.compliance;
            require(
                compliance.information_security_policy.is_some(),
                SECURITY_POLICY_REQUIRED,
            )?;
            // Either form satisfies the requirement; both may be present.
            require(
                compliance.data_privacy_policy.is_some()
                    || !is_blank(&compliance.data_privacy_policy_url),
                PRIVACY_POLICY_REQUIRED,
            )
        }
        Step::Technical => {
            require_organization_id(organization_id)?;
            let infra = &fields.technical.infrastructure;
            require(!is_blank(&infra.cloud_provider), CLOUD_PROVIDER_REQUIRED)?;
            require(!is_blank(&infra.server_region), SERVER_REGION_REQUIRED)?;
            let ips = infra
                .ip_whitelisting
                .as_slice()
                .iter()
                .filter(|ip| !is_blank(ip))
                .count();
            require(ips >= 1, IP_REQUIRED)?;
            require(ips <= MAX_WHITELISTED_IPS, IP_LIMIT_EXCEEDED)
        }
        Step::UseCase | Step::Authorization => require_organization_id(organization_id),
    }
}

fn require_organization_id(organization_id: &str) -> Result<(), GatewayError> {
    require(is_well_formed(organization_id.trim()), ORGANIZATION_ID_REQUIRED)
}

fn require(ok: bool, message: &str) -> Result<(), GatewayError> {
    if ok {
        Ok(())
    } else {
        Err(GatewayError::Validation(message.to_string()))
    }
}
