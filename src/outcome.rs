//! Test outcome records and the per-case wire trace.
//!
//! Every catalog case processed by the runner produces exactly one
//! [`TestResult`]. The result carries the full captured wire exchange plus an
//! ordered log of [`SubAssertion`] records so a failure is diagnosable from
//! the record alone, without re-running the case.

use serde::{Deserialize, Serialize};

use crate::client::{Verb, WireRequest, WireResponse};

/// Final classification of one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// The case behaved as the SCIM specification requires.
    Success,
    /// The case violated the expected protocol contract.
    Error,
    /// The target declared the underlying capability unsupported.
    Skipped,
}

/// Status of a single sub-assertion within a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssertionStatus {
    Success,
    Failed,
    Skipped,
}

/// One observational check appended to a case's running log.
///
/// Sub-assertions never drive control flow outside the case that produced
/// them; they exist so the recorded trace explains the verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAssertion {
    pub name: String,
    /// What the server actually returned, when the check compares values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    /// What the protocol requires, when the check compares values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Free-form description for checks that are not value comparisons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: AssertionStatus,
}

impl SubAssertion {
    /// A comparison-style sub-assertion with actual and expected values.
    pub fn compared(
        name: impl Into<String>,
        actual: impl Into<String>,
        expected: impl Into<String>,
        status: AssertionStatus,
    ) -> Self {
        Self {
            name: name.into(),
            actual: Some(actual.into()),
            expected: Some(expected.into()),
            message: None,
            status,
        }
    }

    /// A descriptive sub-assertion carrying only a message.
    pub fn noted(
        name: impl Into<String>,
        message: impl Into<String>,
        status: AssertionStatus,
    ) -> Self {
        Self {
            name: name.into(),
            actual: None,
            expected: None,
            message: Some(message.into()),
            status,
        }
    }
}

/// The captured request/response pair for one case, plus its assertion log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireTrace {
    pub method: Option<Verb>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
    pub response_headers: Vec<(String, String)>,
    pub response_body: String,
    pub sub_assertions: Vec<SubAssertion>,
}

impl WireTrace {
    /// Start a trace from the request about to be issued.
    pub fn for_request(request: &WireRequest) -> Self {
        Self {
            method: Some(request.verb),
            url: request.url.clone(),
            request_body: request.body.clone(),
            ..Self::default()
        }
    }

    /// Capture the received response into the trace.
    pub fn record_response(&mut self, response: &WireResponse) {
        self.response_status = Some(response.status);
        self.response_headers = response.headers.clone();
        self.response_body = response.body.clone();
    }

    pub fn push(&mut self, assertion: SubAssertion) {
        self.sub_assertions.push(assertion);
    }

    /// Record the standard "Verify Http response code" sub-assertion.
    pub fn assert_status(&mut self, actual: u16, expected: u16, status: AssertionStatus) {
        self.push(SubAssertion::compared(
            "Verify Http response code",
            actual.to_string(),
            expected.to_string(),
            status,
        ));
    }
}

/// One outcome record per processed test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub verdict: Verdict,
    pub case_name: String,
    /// Empty on success, explanatory otherwise.
    pub message: String,
    pub trace: WireTrace,
    pub elapsed_ms: u64,
}

impl TestResult {
    pub fn new(
        verdict: Verdict,
        case_name: impl Into<String>,
        message: impl Into<String>,
        trace: WireTrace,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            verdict,
            case_name: case_name.into(),
            message: message.into(),
            trace,
            elapsed_ms,
        }
    }
}

/// Ordered accumulator of test results for one test method invocation.
///
/// Append order equals catalog order; there is no deduplication and no
/// aggregation. Presentation is the caller's concern.
#[derive(Debug, Default)]
pub struct Recorder {
    results: Vec<TestResult>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: TestResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<TestResult> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_preserves_append_order() {
        let mut recorder = Recorder::new();
        for name in ["first", "second", "third"] {
            recorder.record(TestResult::new(
                Verdict::Success,
                name,
                "",
                WireTrace::default(),
                0,
            ));
        }
        let names: Vec<_> = recorder
            .into_results()
            .into_iter()
            .map(|r| r.case_name)
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn status_assertion_carries_actual_and_expected() {
        let mut trace = WireTrace::default();
        trace.assert_status(409, 201, AssertionStatus::Failed);
        let sub = &trace.sub_assertions[0];
        assert_eq!(sub.actual.as_deref(), Some("409"));
        assert_eq!(sub.expected.as_deref(), Some("201"));
        assert_eq!(sub.status, AssertionStatus::Failed);
    }
}
