//! SCIM 2.0 protocol compliance harness.
//!
//! Exercises a live SCIM service provider over HTTP and reports, per test
//! case, whether the target behaved as RFC 7643/7644 require. The harness
//! covers the `/Users` and `/Groups` endpoints across list, get-by-id,
//! create, patch, put, delete and `.search`, plus capability discovery via
//! `/ServiceProviderConfig`.
//!
//! # Core Components
//!
//! - [`ResourceTestRunner`] - Walks the case catalog for one resource type
//! - [`WireClient`] - Transport seam; [`HttpWireClient`] is the HTTP impl
//! - [`ResponseValidator`] - Schema checks applied to every decoded resource
//! - [`TestResult`] - One verdict plus the captured wire trace per case
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use scim_compliance::{Credentials, HttpWireClient, ResourceKind, ResourceTestRunner};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpWireClient::new(
//!     Credentials::basic("admin", "admin"),
//!     Duration::from_secs(30),
//! )?;
//! let mut runner = ResourceTestRunner::new(client, "https://example.com/scim2", ResourceKind::User);
//! runner.discover_capabilities().await;
//! let results = runner.run_all().await?;
//! for result in &results {
//!     println!("{:?} {}", result.verdict, result.case_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod capabilities;
pub mod catalog;
pub mod client;
pub mod codec;
pub mod error;
pub mod fixtures;
pub mod outcome;
pub mod runner;
pub mod validator;

// Re-export commonly used types for convenience
pub use capabilities::{Capabilities, CapabilitySnapshot, ServiceProviderConfig};
pub use catalog::{AssertionKind, TestCase};
pub use client::{Credentials, HttpWireClient, Verb, WireClient, WireRequest, WireResponse};
pub use codec::{Group, ListResponse, Resource, ResourceKind, User};
pub use error::{ComplianceError, ComplianceResult, FixtureError, TransportError};
pub use outcome::{AssertionStatus, Recorder, SubAssertion, TestResult, Verdict, WireTrace};
pub use runner::ResourceTestRunner;
pub use validator::{ResponseValidator, SchemaValidator};
