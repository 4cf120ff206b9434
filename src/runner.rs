//! Per-resource compliance runner.
//!
//! A [`ResourceTestRunner`] walks the catalog for one resource type and
//! produces one [`TestResult`] per case. Each test method owns its fixture
//! lifecycle: resources seeded for a method are released before the method
//! returns, whatever the individual case verdicts were. Per-case problems
//! become `ERROR` verdicts; only fixture failures abort a method.

use std::time::Instant;

use crate::capabilities::Capabilities;
use crate::catalog::{self, AssertionKind, TestCase};
use crate::client::{Verb, WireClient, WireRequest, WireResponse};
use crate::codec::{ListResponse, Resource, ResourceKind};
use crate::error::{ComplianceResult, FixtureError};
use crate::fixtures::{FixtureCount, FixtureManager};
use crate::outcome::{AssertionStatus, Recorder, SubAssertion, TestResult, Verdict, WireTrace};
use crate::validator::{ResponseValidator, SchemaValidator};

const SKIP_MESSAGE: &str = "This functionality is not implemented. Hence given status code 501";
const DECODE_FAILURE: &str = "Could not decode the server response";
const VALIDATION_FAILURE: &str = "Response Validation Error";

/// In-flight bookkeeping for one catalog case.
struct CaseRun {
    trace: WireTrace,
    started: Instant,
}

impl CaseRun {
    fn begin(request: &WireRequest) -> Self {
        Self {
            trace: WireTrace::for_request(request),
            started: Instant::now(),
        }
    }

    fn finish(self, verdict: Verdict, case_name: &str, message: impl Into<String>) -> TestResult {
        TestResult::new(
            verdict,
            case_name,
            message,
            self.trace,
            self.started.elapsed().as_millis() as u64,
        )
    }
}

/// Runs the full case catalog for one resource type against one target.
pub struct ResourceTestRunner<C: WireClient, V: ResponseValidator = SchemaValidator> {
    client: C,
    base_url: String,
    kind: ResourceKind,
    validator: V,
    capabilities: Capabilities,
}

impl<C: WireClient> ResourceTestRunner<C, SchemaValidator> {
    /// Runner with the default validator and every capability assumed
    /// supported. Call [`discover_capabilities`](Self::discover_capabilities)
    /// to resolve the real flags first.
    pub fn new(client: C, base_url: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            kind,
            validator: SchemaValidator::new(),
            capabilities: Capabilities::all_supported(),
        }
    }
}

impl<C: WireClient, V: ResponseValidator> ResourceTestRunner<C, V> {
    /// Substitute the response validator.
    pub fn with_validator<W: ResponseValidator>(self, validator: W) -> ResourceTestRunner<C, W> {
        ResourceTestRunner {
            client: self.client,
            base_url: self.base_url,
            kind: self.kind,
            validator,
            capabilities: self.capabilities,
        }
    }

    /// Pin the capability flags, bypassing discovery.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Fetch `/ServiceProviderConfig` and adopt its flags for catalog gating.
    pub async fn discover_capabilities(&mut self) -> &Capabilities {
        let snapshot = Capabilities::discover(&self.client, &self.base_url).await;
        self.capabilities = snapshot.capabilities;
        &self.capabilities
    }

    fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url, self.kind.endpoint())
    }

    fn fixtures(&self) -> FixtureManager<'_, C> {
        FixtureManager::new(&self.client, &self.base_url)
    }

    /// Every test method in catalog order.
    pub async fn run_all(&self) -> ComplianceResult<Vec<TestResult>> {
        let mut results = self.list_tests().await?;
        results.extend(self.get_by_id_tests().await?);
        results.extend(self.create_tests().await?);
        results.extend(self.patch_tests().await?);
        results.extend(self.update_tests().await?);
        results.extend(self.delete_tests().await?);
        results.extend(self.search_tests().await?);
        Ok(results)
    }

    /// List-GET cases against the collection endpoint.
    pub async fn list_tests(&self) -> ComplianceResult<Vec<TestResult>> {
        let fixtures = self.fixtures();
        let context = format!("list {} test", self.kind.plural());
        let (user_ids, seeded_ids) = self.seed_collection(&fixtures, &context).await?;

        let mut results = Recorder::new();
        for case in catalog::list_cases(self.kind, &self.capabilities) {
            let url = format!("{}{}", self.endpoint_url(), case.suffix);
            let request = WireRequest::get(&url);
            let failure = format!("Could not list the {} at url {url}", self.kind.plural());
            results.record(match self.dispatch(&case, request, 200, failure).await {
                Err(result) => result,
                Ok((response, run)) => self.examine_list(&case, &response, run, &seeded_ids),
            });
        }

        self.release_collection(&fixtures, &user_ids, &seeded_ids, &context)
            .await?;
        Ok(results.into_results())
    }

    /// GET-by-id cases against one seeded resource.
    pub async fn get_by_id_tests(&self) -> ComplianceResult<Vec<TestResult>> {
        let fixtures = self.fixtures();
        let context = format!("get {} by id test", self.kind.name().to_lowercase());
        let (user_ids, id) = self.seed_target(&fixtures, &context).await?;

        let mut results = Recorder::new();
        for case in catalog::get_by_id_cases(self.kind) {
            let url = format!("{}/{}{}", self.endpoint_url(), id, case.suffix);
            let request = WireRequest::get(&url);
            let failure = format!(
                "Could not get the default {} at url {url}",
                self.kind.name().to_lowercase()
            );
            results.record(match self.dispatch(&case, request, 200, failure).await {
                Err(result) => result,
                Ok((response, run)) => self.examine_resource(&case, &response, run),
            });
        }

        self.release_target(&fixtures, &user_ids, Some(id), &context)
            .await?;
        Ok(results.into_results())
    }

    /// POST-create cases. Successfully created resources are removed before
    /// this method returns.
    pub async fn create_tests(&self) -> ComplianceResult<Vec<TestResult>> {
        let fixtures = self.fixtures();
        let context = format!("create {} test", self.kind.name().to_lowercase());
        let user_ids = self.seed_member_users(&fixtures, &context).await?;

        let mut created: Vec<String> = Vec::new();
        let mut results = Recorder::new();
        for case in catalog::create_cases(self.kind, &user_ids) {
            let url = self.endpoint_url();
            let body = case.body.clone().unwrap_or_default();
            let request = WireRequest::with_body(Verb::Post, &url, body);
            let failure = format!(
                "Could not create default {} at url {url}",
                self.kind.name().to_lowercase()
            );
            let result = match self.dispatch(&case, request, 201, failure).await {
                Err(result) => result,
                Ok((response, run)) => {
                    // Track the created id before examining the response, so
                    // a 201 that then fails validation is still cleaned up.
                    if let Ok(resource) = Resource::decode(self.kind, &response.body)
                        && let Ok(id) = resource.require_id()
                    {
                        created.push(id.to_string());
                    }
                    self.examine_resource(&case, &response, run)
                }
            };
            results.record(result);
        }

        let mut first_failure = self
            .release_ids(&fixtures, self.kind, &created, &context)
            .await;
        if let Err(err) = self
            .release_ids_result(&fixtures, ResourceKind::User, &user_ids, &context)
            .await
            && first_failure.is_none()
        {
            first_failure = Some(err);
        }
        match first_failure {
            Some(err) => Err(err.into()),
            None => Ok(results.into_results()),
        }
    }

    /// PATCH cases; each case patches a freshly seeded resource.
    pub async fn patch_tests(&self) -> ComplianceResult<Vec<TestResult>> {
        self.mutation_tests(Verb::Patch).await
    }

    /// PUT-replace cases; each case replaces a freshly seeded resource.
    pub async fn update_tests(&self) -> ComplianceResult<Vec<TestResult>> {
        self.mutation_tests(Verb::Put).await
    }

    /// DELETE cases. Each case seeds its own resource; a resource the tested
    /// call removed is not deleted again during release.
    pub async fn delete_tests(&self) -> ComplianceResult<Vec<TestResult>> {
        let fixtures = self.fixtures();
        let context = format!("delete {} test", self.kind.name().to_lowercase());
        let user_ids = self.seed_member_users(&fixtures, &context).await?;

        let mut results = Recorder::new();
        let mut outcome = Ok(());
        for case in catalog::delete_cases(self.kind) {
            let id = match self.seed_one(&fixtures, &user_ids, case.name).await {
                Ok(id) => id,
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            };
            // The delete-twice case removes its fixture up front so the
            // tested call hits a gone resource.
            let mut survives = true;
            if matches!(
                case.assertion,
                AssertionKind::ExpectedErrorStatus { status: 404, .. }
            ) && case.suffix.is_empty()
            {
                if let Err(err) = self.release_one(&fixtures, &id, case.name).await {
                    outcome = Err(err);
                    break;
                }
                survives = false;
            }

            let url = format!("{}/{}{}", self.endpoint_url(), id, case.suffix);
            let request = WireRequest::delete(&url);
            let failure = format!(
                "Could not delete the default {} at url {url}",
                self.kind.name().to_lowercase()
            );
            let result = match self.dispatch(&case, request, 204, failure).await {
                Err(result) => result,
                Ok((_, run)) => {
                    // 204 carries no body; the status assertion is the case.
                    if case.suffix.is_empty() {
                        survives = false;
                    }
                    run.finish(Verdict::Success, case.name, "")
                }
            };
            results.record(result);

            if survives && let Err(err) = self.release_one(&fixtures, &id, case.name).await {
                outcome = Err(err);
                break;
            }
        }

        let released = self
            .release_ids_result(&fixtures, ResourceKind::User, &user_ids, &context)
            .await;
        outcome?;
        released?;
        Ok(results.into_results())
    }

    /// `POST /.search` cases against the seeded collection.
    pub async fn search_tests(&self) -> ComplianceResult<Vec<TestResult>> {
        let fixtures = self.fixtures();
        let context = format!("search {} test", self.kind.plural());
        let (user_ids, seeded_ids) = self.seed_collection(&fixtures, &context).await?;

        let url = format!("{}/.search", self.endpoint_url());
        let mut results = Recorder::new();
        for case in catalog::search_cases(self.kind) {
            let body = case.body.clone().unwrap_or_default();
            let request = WireRequest::with_body(Verb::Post, &url, body);
            let failure = format!("Could not search the {} at url {url}", self.kind.plural());
            results.record(match self.dispatch(&case, request, 200, failure).await {
                Err(result) => result,
                Ok((response, run)) => self.examine_list(&case, &response, run, &seeded_ids),
            });
        }

        self.release_collection(&fixtures, &user_ids, &seeded_ids, &context)
            .await?;
        Ok(results.into_results())
    }

    /// Shared body of the PATCH and PUT test methods. The two differ only in
    /// the verb, the catalog and the failure wording.
    async fn mutation_tests(&self, verb: Verb) -> ComplianceResult<Vec<TestResult>> {
        let action = if verb == Verb::Patch { "patch" } else { "update" };
        let fixtures = self.fixtures();
        let context = format!("{action} {} test", self.kind.name().to_lowercase());
        let user_ids = self.seed_member_users(&fixtures, &context).await?;

        let cases = if verb == Verb::Patch {
            catalog::patch_cases(self.kind, &self.capabilities, &user_ids, &self.base_url)
        } else {
            catalog::update_cases(self.kind)
        };

        let mut results = Recorder::new();
        let mut outcome = Ok(());
        for case in cases {
            let id = match self.seed_one(&fixtures, &user_ids, case.name).await {
                Ok(id) => id,
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            };
            let url = format!("{}/{}{}", self.endpoint_url(), id, case.suffix);
            let body = case.body.clone().unwrap_or_default();
            let request = WireRequest::with_body(verb, &url, body);
            let failure = format!(
                "Could not {action} the default {} at url {url}",
                self.kind.name().to_lowercase()
            );
            results.record(match self.dispatch(&case, request, 200, failure).await {
                Err(result) => result,
                Ok((response, run)) => self.examine_resource(&case, &response, run),
            });
            if let Err(err) = self.release_one(&fixtures, &id, case.name).await {
                outcome = Err(err);
                break;
            }
        }

        let released = self
            .release_ids_result(&fixtures, ResourceKind::User, &user_ids, &context)
            .await;
        outcome?;
        released?;
        Ok(results.into_results())
    }

    /// Issue the request and classify everything short of scenario checks.
    ///
    /// `Ok` carries the response for further examination; `Err` carries an
    /// already-final result (transport failure, expected-error outcome,
    /// capability skip or status mismatch).
    async fn dispatch(
        &self,
        case: &TestCase,
        request: WireRequest,
        success_status: u16,
        failure_message: String,
    ) -> Result<(WireResponse, CaseRun), TestResult> {
        let mut run = CaseRun::begin(&request);
        log::debug!("{}: {} {}", case.name, request.verb, request.url);

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                log::debug!("{}: transport failure: {err}", case.name);
                return Err(if case.expected_supported {
                    run.finish(Verdict::Error, case.name, failure_message)
                } else {
                    run.finish(Verdict::Skipped, case.name, SKIP_MESSAGE)
                });
            }
        };
        run.trace.record_response(&response);

        if let AssertionKind::ExpectedErrorStatus { status: expected, message } = case.assertion {
            return Err(if response.status == expected {
                run.trace
                    .assert_status(response.status, expected, AssertionStatus::Success);
                run.finish(Verdict::Success, case.name, message)
            } else if !case.expected_supported || response.status == 501 {
                run.trace
                    .assert_status(response.status, expected, AssertionStatus::Skipped);
                run.finish(Verdict::Skipped, case.name, SKIP_MESSAGE)
            } else {
                run.trace
                    .assert_status(response.status, expected, AssertionStatus::Failed);
                run.finish(Verdict::Error, case.name, "")
            });
        }

        if response.status == success_status {
            run.trace
                .assert_status(response.status, success_status, AssertionStatus::Success);
            Ok((response, run))
        } else if !case.expected_supported || response.status == 501 {
            run.trace
                .assert_status(response.status, success_status, AssertionStatus::Skipped);
            Err(run.finish(Verdict::Skipped, case.name, SKIP_MESSAGE))
        } else {
            run.trace
                .assert_status(response.status, success_status, AssertionStatus::Failed);
            Err(run.finish(Verdict::Error, case.name, ""))
        }
    }

    /// Decode, validate and scenario-check a single-resource response.
    fn examine_resource(
        &self,
        case: &TestCase,
        response: &WireResponse,
        mut run: CaseRun,
    ) -> TestResult {
        let resource = match Resource::decode(self.kind, &response.body) {
            Ok(resource) => resource,
            Err(err) => {
                log::debug!("{}: {err}", case.name);
                return run.finish(Verdict::Error, case.name, DECODE_FAILURE);
            }
        };
        if self
            .validator
            .validate(&resource, &mut run.trace)
            .is_err()
        {
            return run.finish(Verdict::Error, case.name, VALIDATION_FAILURE);
        }
        if case.suffix.is_empty() {
            self.note_location_header(response, &resource, &mut run.trace);
        }

        let failed = match &case.assertion {
            AssertionKind::ProjectedAttributes => {
                let attribute = self.kind.filter_attribute();
                let present = resource.filter_value().is_some();
                run.trace.push(SubAssertion::noted(
                    "Attributes Test",
                    format!("Check the requested attribute {attribute} is returned."),
                    if present {
                        AssertionStatus::Success
                    } else {
                        AssertionStatus::Failed
                    },
                ));
                (!present).then(|| "Response does not contain the requested attributes".to_string())
            }
            AssertionKind::ExcludedAttribute { attribute } => {
                let present = match &resource {
                    Resource::User(user) => user
                        .enterprise
                        .as_ref()
                        .is_some_and(|e| e.employee_number.is_some()),
                    Resource::Group(group) => !group.members.is_empty(),
                };
                run.trace.push(SubAssertion::noted(
                    "Excluded Attributes Test",
                    format!("Check the excluded attribute {attribute} is not returned."),
                    if present {
                        AssertionStatus::Failed
                    } else {
                        AssertionStatus::Success
                    },
                ));
                present.then(|| format!("Response contains the excluded attribute {attribute}"))
            }
            _ => None,
        };
        match failed {
            Some(message) => run.finish(Verdict::Error, case.name, message),
            None => run.finish(Verdict::Success, case.name, ""),
        }
    }

    /// Decode, validate and scenario-check a list-response body.
    fn examine_list(
        &self,
        case: &TestCase,
        response: &WireResponse,
        mut run: CaseRun,
        seeded_ids: &[String],
    ) -> TestResult {
        let list = match ListResponse::decode(&response.body) {
            Ok(list) => list,
            Err(err) => {
                log::debug!("{}: {err}", case.name);
                return run.finish(Verdict::Error, case.name, DECODE_FAILURE);
            }
        };
        let resources = match list.decode_resources(self.kind) {
            Ok(resources) => resources,
            Err(err) => {
                log::debug!("{}: {err}", case.name);
                return run.finish(Verdict::Error, case.name, DECODE_FAILURE);
            }
        };
        for resource in &resources {
            if self
                .validator
                .validate(resource, &mut run.trace)
                .is_err()
            {
                return run.finish(Verdict::Error, case.name, VALIDATION_FAILURE);
            }
        }
        match self.check_list_scenario(&case.assertion, &list, &resources, seeded_ids, &mut run.trace)
        {
            Ok(()) => run.finish(Verdict::Success, case.name, ""),
            Err(message) => run.finish(Verdict::Error, case.name, message),
        }
    }

    /// Scenario assertions over a decoded list; `Err` is the verdict message.
    fn check_list_scenario(
        &self,
        assertion: &AssertionKind,
        list: &ListResponse,
        resources: &[Resource],
        seeded_ids: &[String],
        trace: &mut WireTrace,
    ) -> Result<(), String> {
        let attribute = self.kind.filter_attribute();
        let plural = self.kind.plural();
        match assertion {
            AssertionKind::None | AssertionKind::ExpectedErrorStatus { .. } => Ok(()),
            AssertionKind::AllResourcesPresent => {
                let name = match self.kind {
                    ResourceKind::User => "Test listing all users",
                    ResourceKind::Group => "All Groups In Test",
                };
                let note = format!(
                    "Check the created {} {plural} are listed.",
                    seeded_ids.len()
                );
                let all_present = seeded_ids.iter().all(|id| {
                    resources
                        .iter()
                        .any(|r| r.id() == Some(id.as_str()))
                });
                trace.push(SubAssertion::noted(
                    name,
                    note,
                    if all_present {
                        AssertionStatus::Success
                    } else {
                        AssertionStatus::Failed
                    },
                ));
                if all_present {
                    Ok(())
                } else {
                    Err(format!("Response does not contain all the created {plural}"))
                }
            }
            AssertionKind::FilterEquals { value } => {
                let value: &str = value;
                let offender = resources
                    .iter()
                    .find(|r| r.filter_value() != Some(value));
                let status = if offender.is_none() {
                    AssertionStatus::Success
                } else {
                    AssertionStatus::Failed
                };
                let actual = offender
                    .map(|r| r.filter_value().unwrap_or_default())
                    .unwrap_or(value);
                trace.push(SubAssertion::compared(
                    "Validate the filter response with the filter search attribute",
                    format!("{attribute}:{actual}"),
                    format!("{attribute}:{value}"),
                    status,
                ));
                if offender.is_none() {
                    Ok(())
                } else {
                    Err(format!("Response does not contain the expected {plural}"))
                }
            }
            AssertionKind::FilterNotEquals { value } => {
                let value: &str = value;
                let offender = resources
                    .iter()
                    .find(|r| r.filter_value() == Some(value));
                trace.push(SubAssertion::compared(
                    "Validate the filter response with the filter search attribute",
                    format!("{attribute}:{value}"),
                    format!("not {attribute}:{value}"),
                    if offender.is_none() {
                        AssertionStatus::Success
                    } else {
                        AssertionStatus::Failed
                    },
                ));
                if offender.is_none() {
                    Ok(())
                } else {
                    Err(format!("Response contains the unexpected {plural}"))
                }
            }
            AssertionKind::PageSize { start_index, count } => {
                let name = match self.kind {
                    ResourceKind::User => "Validate paginated users response",
                    ResourceKind::Group => "Pagination Group Test",
                };
                let actual_index = list.start_index.unwrap_or_default();
                let ok = resources.len() == *count && actual_index == *start_index;
                trace.push(SubAssertion::compared(
                    name,
                    format!("startIndex:{actual_index},itemsPerPage:{}", resources.len()),
                    format!("startIndex:{start_index},itemsPerPage:{count}"),
                    if ok {
                        AssertionStatus::Success
                    } else {
                        AssertionStatus::Failed
                    },
                ));
                if ok {
                    Ok(())
                } else {
                    Err("Response does not contain right number of pagination.".to_string())
                }
            }
            AssertionKind::DefaultStartIndex { count } => {
                let name = match self.kind {
                    ResourceKind::User => "Test user pagination when startIndex is not specified",
                    ResourceKind::Group => "Test group pagination when startIndex is not specified",
                };
                let actual_index = list.start_index.unwrap_or_default();
                // Either a wrong default index or a wrong page size fails.
                let ok = actual_index == 1 && resources.len() == *count;
                trace.push(SubAssertion::compared(
                    name,
                    format!("startIndex:{actual_index},itemsPerPage:{}", resources.len()),
                    format!("startIndex:1,itemsPerPage:{count}"),
                    if ok {
                        AssertionStatus::Success
                    } else {
                        AssertionStatus::Failed
                    },
                ));
                if ok {
                    Ok(())
                } else {
                    Err("Response does not contain right number of pagination.".to_string())
                }
            }
            AssertionKind::SortedAscending => {
                let name = match self.kind {
                    ResourceKind::User => "Sort Users Test",
                    ResourceKind::Group => "Sort Groups Test",
                };
                let ids: Vec<&str> = resources.iter().filter_map(Resource::id).collect();
                let sorted = ids.windows(2).all(|pair| pair[0] <= pair[1]);
                trace.push(SubAssertion::noted(
                    name,
                    format!(
                        "Check the created {} {plural} are sorted or not.",
                        seeded_ids.len()
                    ),
                    if sorted {
                        AssertionStatus::Success
                    } else {
                        AssertionStatus::Failed
                    },
                ));
                if sorted {
                    Ok(())
                } else {
                    Err(format!(
                        "Response does not contain the sorted list of {plural}"
                    ))
                }
            }
            AssertionKind::FilterWithPagination { value, count } => {
                let value: &str = value;
                let name = match self.kind {
                    ResourceKind::User => "Test user filtering with pagination params",
                    ResourceKind::Group => "Test group filtering with pagination params",
                };
                if resources.len() != *count {
                    trace.push(SubAssertion::compared(
                        name,
                        format!("itemsPerPage:{}", resources.len()),
                        format!("itemsPerPage:{count}"),
                        AssertionStatus::Failed,
                    ));
                    return Err(format!(
                        "Response does not contain right number of {plural}."
                    ));
                }
                let mismatch = resources
                    .iter()
                    .any(|r| r.filter_value() != Some(value));
                trace.push(SubAssertion::compared(
                    name,
                    format!("itemsPerPage:{count},{attribute}:{}",
                        resources
                            .first()
                            .and_then(|r| r.filter_value())
                            .unwrap_or_default()
                    ),
                    format!("itemsPerPage:{count},{attribute}:{value}"),
                    if mismatch {
                        AssertionStatus::Failed
                    } else {
                        AssertionStatus::Success
                    },
                ));
                if mismatch {
                    Err(format!("Response does not contain the expected {plural}"))
                } else {
                    Ok(())
                }
            }
            AssertionKind::TotalResultsEquals(expected) => {
                let actual = list.total_results.unwrap_or_default();
                let ok = actual == *expected;
                trace.push(SubAssertion::compared(
                    "Validate the search response total results",
                    format!("totalResults:{actual}"),
                    format!("totalResults:{expected}"),
                    if ok {
                        AssertionStatus::Success
                    } else {
                        AssertionStatus::Failed
                    },
                ));
                if ok {
                    Ok(())
                } else {
                    Err("Response does not contain the expected total results".to_string())
                }
            }
            AssertionKind::ProjectedAttributes | AssertionKind::ExcludedAttribute { .. } => Ok(()),
        }
    }

    /// Advisory check that the `Location` header agrees with the decoded
    /// body's `meta.location`. A mismatch is recorded as a failed
    /// sub-assertion but never flips the verdict.
    fn note_location_header(
        &self,
        response: &WireResponse,
        resource: &Resource,
        trace: &mut WireTrace,
    ) {
        let Some(expected) = resource.meta().and_then(|m| m.location.as_deref()) else {
            return;
        };
        let actual = response.location().unwrap_or_default();
        trace.push(SubAssertion::compared(
            "Verify Location Header",
            actual,
            expected,
            if actual == expected {
                AssertionStatus::Success
            } else {
                AssertionStatus::Failed
            },
        ));
    }

    // Fixture plumbing. Group scenarios need seeded users first because the
    // group payloads embed member ids.

    async fn seed_member_users(
        &self,
        fixtures: &FixtureManager<'_, C>,
        context: &str,
    ) -> Result<Vec<String>, FixtureError> {
        match self.kind {
            ResourceKind::User => Ok(Vec::new()),
            ResourceKind::Group => fixtures.create_users(FixtureCount::Many, context).await,
        }
    }

    /// Seed the full collection a list/search method works over. Returns the
    /// supporting user ids and the ids the list assertions refer to.
    async fn seed_collection(
        &self,
        fixtures: &FixtureManager<'_, C>,
        context: &str,
    ) -> Result<(Vec<String>, Vec<String>), FixtureError> {
        match self.kind {
            ResourceKind::User => {
                let ids = fixtures.create_users(FixtureCount::Many, context).await?;
                Ok((Vec::new(), ids))
            }
            ResourceKind::Group => {
                let user_ids = fixtures.create_users(FixtureCount::Many, context).await?;
                match fixtures
                    .create_groups(&user_ids, FixtureCount::Many, context)
                    .await
                {
                    Ok(group_ids) => Ok((user_ids, group_ids)),
                    Err(err) => {
                        let _ = self
                            .release_ids(fixtures, ResourceKind::User, &user_ids, context)
                            .await;
                        Err(err)
                    }
                }
            }
        }
    }

    /// Seed one target resource plus any supporting users.
    async fn seed_target(
        &self,
        fixtures: &FixtureManager<'_, C>,
        context: &str,
    ) -> Result<(Vec<String>, String), FixtureError> {
        match self.kind {
            ResourceKind::User => {
                let mut ids = fixtures.create_users(FixtureCount::One, context).await?;
                Ok((Vec::new(), ids.swap_remove(0)))
            }
            ResourceKind::Group => {
                let user_ids = fixtures.create_users(FixtureCount::One, context).await?;
                match fixtures
                    .create_groups(&user_ids, FixtureCount::One, context)
                    .await
                {
                    Ok(mut group_ids) => Ok((user_ids, group_ids.swap_remove(0))),
                    Err(err) => {
                        let _ = self
                            .release_ids(fixtures, ResourceKind::User, &user_ids, context)
                            .await;
                        Err(err)
                    }
                }
            }
        }
    }

    /// Seed one resource of the runner's kind, reusing already-seeded users.
    async fn seed_one(
        &self,
        fixtures: &FixtureManager<'_, C>,
        user_ids: &[String],
        context: &str,
    ) -> Result<String, FixtureError> {
        let mut ids = match self.kind {
            ResourceKind::User => fixtures.create_users(FixtureCount::One, context).await?,
            ResourceKind::Group => {
                fixtures
                    .create_groups(user_ids, FixtureCount::One, context)
                    .await?
            }
        };
        Ok(ids.swap_remove(0))
    }

    async fn release_one(
        &self,
        fixtures: &FixtureManager<'_, C>,
        id: &str,
        context: &str,
    ) -> Result<(), FixtureError> {
        match self.kind {
            ResourceKind::User => fixtures.delete_user(id, context).await,
            ResourceKind::Group => fixtures.delete_group(id, context).await,
        }
    }

    async fn release_target(
        &self,
        fixtures: &FixtureManager<'_, C>,
        user_ids: &[String],
        id: Option<String>,
        context: &str,
    ) -> ComplianceResult<()> {
        let mut first_failure = None;
        if let Some(id) = id
            && let Err(err) = self.release_one(fixtures, &id, context).await
        {
            first_failure = Some(err);
        }
        if let Err(err) = self
            .release_ids_result(fixtures, ResourceKind::User, user_ids, context)
            .await
            && first_failure.is_none()
        {
            first_failure = Some(err);
        }
        match first_failure {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    async fn release_collection(
        &self,
        fixtures: &FixtureManager<'_, C>,
        user_ids: &[String],
        seeded_ids: &[String],
        context: &str,
    ) -> ComplianceResult<()> {
        let mut first_failure = self
            .release_ids(fixtures, self.kind, seeded_ids, context)
            .await;
        if let Err(err) = self
            .release_ids_result(fixtures, ResourceKind::User, user_ids, context)
            .await
            && first_failure.is_none()
        {
            first_failure = Some(err);
        }
        match first_failure {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Delete every id; all deletes are attempted, the first failure wins.
    async fn release_ids(
        &self,
        fixtures: &FixtureManager<'_, C>,
        kind: ResourceKind,
        ids: &[String],
        context: &str,
    ) -> Option<FixtureError> {
        let mut first_failure = None;
        for id in ids {
            let outcome = match kind {
                ResourceKind::User => fixtures.delete_user(id, context).await,
                ResourceKind::Group => fixtures.delete_group(id, context).await,
            };
            if let Err(err) = outcome {
                log::warn!("release of {} {id} failed: {err}", kind.name());
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
        first_failure
    }

    async fn release_ids_result(
        &self,
        fixtures: &FixtureManager<'_, C>,
        kind: ResourceKind,
        ids: &[String],
        context: &str,
    ) -> Result<(), FixtureError> {
        match self.release_ids(fixtures, kind, ids, context).await {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
