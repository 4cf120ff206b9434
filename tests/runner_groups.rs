//! End-to-end runs of the group catalog against the in-memory target.

mod common;

use common::{BASE_URL, FakeScimServer, provider_config_without_filtering};
use scim_compliance::{ResourceKind, ResourceTestRunner, TestResult, Verdict};

fn assert_all_success(results: &[TestResult]) {
    for result in results {
        assert_eq!(
            result.verdict,
            Verdict::Success,
            "case '{}' failed: {}",
            result.case_name,
            result.message
        );
    }
}

fn by_name<'a>(results: &'a [TestResult], name: &str) -> &'a TestResult {
    results
        .iter()
        .find(|r| r.case_name == name)
        .unwrap_or_else(|| panic!("no result for case '{name}'"))
}

#[tokio::test]
async fn full_group_catalog_passes_against_conformant_target() {
    common::init_logging();
    let server = FakeScimServer::new();
    let mut runner = ResourceTestRunner::new(&server, BASE_URL, ResourceKind::Group);
    runner.discover_capabilities().await;
    let results = runner.run_all().await.unwrap();

    // 18 list + 4 get + 3 create + 6 patch + 3 put + 3 delete + 4 search.
    assert_eq!(results.len(), 41);
    assert_all_success(&results);

    // Supporting users are released along with the groups.
    assert_eq!(server.live_users(), 0);
    assert_eq!(server.live_groups(), 0);
    assert_eq!(server.leaked_resources(), 0);
}

#[tokio::test]
async fn group_search_matches_exactly_one_display_name() {
    let server = FakeScimServer::new();
    let runner = ResourceTestRunner::new(&server, BASE_URL, ResourceKind::Group);
    let results = runner.search_tests().await.unwrap();

    assert_all_success(&results);
    let invalid = by_name(&results, "Search group with invalid filter");
    assert_eq!(
        invalid.message,
        "Service Provider successfully given the expected error 400 message"
    );
}

#[tokio::test]
async fn declared_unsupported_filtering_skips_gated_cases() {
    let mut server = FakeScimServer::new();
    server.provider_config = Some(provider_config_without_filtering());
    server.reject_filtering = true;

    let mut runner = ResourceTestRunner::new(&server, BASE_URL, ResourceKind::Group);
    let caps = runner.discover_capabilities().await;
    assert!(!caps.filter);

    let results = runner.list_tests().await.unwrap();
    let gated = by_name(&results, "Get groups with displayName as filter");
    assert_eq!(gated.verdict, Verdict::Skipped);
    // Mandatory cases still run against the same target.
    assert_eq!(by_name(&results, "List groups").verdict, Verdict::Success);
}

#[tokio::test]
async fn group_patch_error_cases_return_expected_statuses() {
    let server = FakeScimServer::new();
    let runner = ResourceTestRunner::new(&server, BASE_URL, ResourceKind::Group);
    let results = runner.patch_tests().await.unwrap();

    assert_all_success(&results);
    assert_eq!(
        by_name(&results, "Patch group and validate error response").message,
        "Service Provider successfully given the expected error 400"
    );
    assert_eq!(
        by_name(&results, "Patch non existing group").message,
        "Server successfully given the expected error 404 message"
    );
    assert_eq!(server.live_groups(), 0);
}

#[tokio::test]
async fn group_update_schema_violation_is_rejected() {
    let server = FakeScimServer::new();
    let runner = ResourceTestRunner::new(&server, BASE_URL, ResourceKind::Group);
    let results = runner.update_tests().await.unwrap();

    assert_all_success(&results);
    assert_eq!(
        by_name(
            &results,
            "Update group with schema violation to validate error response"
        )
        .message,
        "Service Provider successfully given the expected error 400"
    );
}
