//! Error types for the compliance harness.
//!
//! The taxonomy separates failures by severity: fixture errors abort the
//! enclosing test method, while transport, decode and validation errors stay
//! scoped to the single case that produced them.

use crate::outcome::TestResult;

/// Top-level error for a test-method invocation.
///
/// Per-case problems never surface here; they become `Error` verdicts on the
/// affected [`TestResult`]. Only fixture seeding/teardown failures abort the
/// whole method.
#[derive(Debug, thiserror::Error)]
pub enum ComplianceError {
    /// Fixture creation or cleanup failed outside the scenario under test.
    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

/// A fixture seeding or teardown failure.
///
/// Carries a synthesized [`TestResult`] so the reporting layer can show the
/// wire exchange that broke the run, tagged with the scenario it belonged to.
#[derive(Debug, thiserror::Error)]
#[error("fixture failure during '{context}': {}", result.message)]
pub struct FixtureError {
    /// The scenario name being seeded or cleaned up after.
    pub context: String,
    pub result: Box<TestResult>,
}

impl FixtureError {
    pub fn new(context: impl Into<String>, result: TestResult) -> Self {
        Self {
            context: context.into(),
            result: Box::new(result),
        }
    }
}

/// Transport-level failure from the wire client.
///
/// The harness itself adds no retry or timeout layer; whatever the underlying
/// HTTP client reports is captured here verbatim.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established or was dropped mid-exchange.
    #[error("could not reach {url}: {message}")]
    Connection { url: String, message: String },

    /// The request was malformed before it ever left the client.
    #[error("invalid request for {url}: {message}")]
    InvalidRequest { url: String, message: String },
}

impl TransportError {
    pub fn connection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Decode failure from the SCIM codec.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The body was not parseable JSON of the expected shape.
    #[error("malformed SCIM payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A structurally required field was absent after parsing.
    #[error("missing required field '{field}' in {resource_type} payload")]
    MissingField {
        resource_type: String,
        field: String,
    },

    /// The body was empty where a resource was required.
    #[error("empty response body where a {resource_type} was expected")]
    EmptyBody { resource_type: String },
}

impl DecodeError {
    pub fn missing_field(resource_type: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            resource_type: resource_type.into(),
            field: field.into(),
        }
    }
}

/// Rejection from the response validator.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The `schemas` attribute is missing or does not list the core schema.
    #[error("resource does not declare schema '{schema_uri}'")]
    MissingSchemaUri { schema_uri: String },

    /// A required attribute is missing from the response.
    #[error("required attribute '{attribute}' is missing")]
    MissingRequiredAttribute { attribute: String },

    /// A write-only attribute was returned by the server.
    #[error("write-only attribute '{attribute}' must not be returned")]
    WriteOnlyAttributeReturned { attribute: String },

    /// `meta.resourceType` disagrees with the endpoint's resource type.
    #[error("meta.resourceType is '{actual}', expected '{expected}'")]
    ResourceTypeMismatch { expected: String, actual: String },
}

impl ValidationError {
    pub fn missing_required(attribute: impl Into<String>) -> Self {
        Self::MissingRequiredAttribute {
            attribute: attribute.into(),
        }
    }
}

pub type ComplianceResult<T> = Result<T, ComplianceError>;
