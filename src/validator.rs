//! Response validation seam.
//!
//! The runner hands every successfully decoded resource to a
//! [`ResponseValidator`] before scenario assertions run. The default
//! [`SchemaValidator`] checks schema declaration, required attributes and
//! write-only mutability; a custom implementation can substitute a full
//! schema engine without touching the runner.

use crate::codec::Resource;
use crate::error::ValidationError;
use crate::outcome::{AssertionStatus, SubAssertion, WireTrace};

/// Validates a decoded resource against its schema contract.
///
/// Implementations append their sub-assertions to `trace` as they go, so a
/// rejection is diagnosable from the recorded wire exchange: the failing
/// check is the last sub-assertion appended before the error.
pub trait ResponseValidator: Send + Sync {
    fn validate(&self, resource: &Resource, trace: &mut WireTrace) -> Result<(), ValidationError>;
}

/// Default validator covering the checks every SCIM response must pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    fn check_schemas(&self, resource: &Resource, trace: &mut WireTrace) -> Result<(), ValidationError> {
        let urn = resource.kind().schema_urn();
        // Servers may omit "schemas" on projected responses; only a present
        // but wrong list is a violation.
        let schemas = resource.schemas();
        let ok = schemas.is_empty() || schemas.iter().any(|s| s == urn);
        trace.push(SubAssertion::noted(
            "Schema Test",
            format!("Check the response declares schema {urn}."),
            if ok {
                AssertionStatus::Success
            } else {
                AssertionStatus::Failed
            },
        ));
        if ok {
            Ok(())
        } else {
            Err(ValidationError::MissingSchemaUri {
                schema_uri: urn.to_string(),
            })
        }
    }

    fn check_required(&self, resource: &Resource, trace: &mut WireTrace) -> Result<(), ValidationError> {
        let missing = match resource.id() {
            Some(id) if !id.is_empty() => None,
            _ => Some("id"),
        };
        trace.push(SubAssertion::noted(
            "Required Attribute Test",
            "Check the server-assigned id is present.",
            if missing.is_none() {
                AssertionStatus::Success
            } else {
                AssertionStatus::Failed
            },
        ));
        match missing {
            None => Ok(()),
            Some(attribute) => Err(ValidationError::missing_required(attribute)),
        }
    }

    fn check_mutability(&self, resource: &Resource, trace: &mut WireTrace) -> Result<(), ValidationError> {
        // password is writeOnly/never-returned per RFC 7643.
        let leaked = resource
            .as_user()
            .map(|u| u.password.is_some())
            .unwrap_or(false);
        trace.push(SubAssertion::noted(
            "Attribute Mutability Test",
            "Check no write-only attribute is returned.",
            if leaked {
                AssertionStatus::Failed
            } else {
                AssertionStatus::Success
            },
        ));
        if leaked {
            Err(ValidationError::WriteOnlyAttributeReturned {
                attribute: "password".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn check_resource_type(&self, resource: &Resource, trace: &mut WireTrace) -> Result<(), ValidationError> {
        let expected = resource.kind().name();
        let declared = resource.meta().and_then(|m| m.resource_type.as_deref());
        match declared {
            Some(actual) if actual != expected => {
                trace.push(SubAssertion::compared(
                    "Schema Test",
                    format!("meta.resourceType:{actual}"),
                    format!("meta.resourceType:{expected}"),
                    AssertionStatus::Failed,
                ));
                Err(ValidationError::ResourceTypeMismatch {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl ResponseValidator for SchemaValidator {
    fn validate(&self, resource: &Resource, trace: &mut WireTrace) -> Result<(), ValidationError> {
        self.check_schemas(resource, trace)?;
        self.check_required(resource, trace)?;
        self.check_mutability(resource, trace)?;
        self.check_resource_type(resource, trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Resource, ResourceKind};

    fn validate(kind: ResourceKind, body: &str) -> (Result<(), ValidationError>, WireTrace) {
        let resource = Resource::decode(kind, body).unwrap();
        let mut trace = WireTrace::default();
        let outcome = SchemaValidator::new().validate(&resource, &mut trace);
        (outcome, trace)
    }

    #[test]
    fn well_formed_user_passes() {
        let (outcome, trace) = validate(
            ResourceKind::User,
            r#"{"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "id": "1", "userName": "loginUser",
                "meta": {"resourceType": "User"}}"#,
        );
        assert!(outcome.is_ok());
        assert_eq!(trace.sub_assertions.len(), 3);
    }

    #[test]
    fn missing_id_is_rejected() {
        let (outcome, trace) = validate(
            ResourceKind::User,
            r#"{"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"], "userName": "u"}"#,
        );
        assert!(matches!(
            outcome,
            Err(ValidationError::MissingRequiredAttribute { .. })
        ));
        // The failing check is the last appended sub-assertion.
        assert_eq!(
            trace.sub_assertions.last().unwrap().status,
            AssertionStatus::Failed
        );
    }

    #[test]
    fn returned_password_violates_mutability() {
        let (outcome, _) = validate(
            ResourceKind::User,
            r#"{"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "id": "1", "userName": "u", "password": "7019asd84"}"#,
        );
        assert!(matches!(
            outcome,
            Err(ValidationError::WriteOnlyAttributeReturned { .. })
        ));
    }

    #[test]
    fn wrong_core_schema_is_rejected() {
        let (outcome, _) = validate(
            ResourceKind::Group,
            r#"{"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "id": "1", "displayName": "g"}"#,
        );
        assert!(matches!(
            outcome,
            Err(ValidationError::MissingSchemaUri { .. })
        ));
    }
}
