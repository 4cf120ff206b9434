//! Capability discovery and fixture lifecycle behavior.

mod common;

use common::{BASE_URL, FakeScimServer, provider_config_without_filtering};
use scim_compliance::capabilities::Capabilities;
use scim_compliance::fixtures::{FixtureCount, FixtureManager};

#[tokio::test]
async fn discovery_adopts_the_declared_flags() {
    let mut server = FakeScimServer::new();
    server.provider_config = Some(provider_config_without_filtering());

    let snapshot = Capabilities::discover(&server, BASE_URL).await;
    assert!(!snapshot.capabilities.filter);
    assert!(snapshot.capabilities.patch);
    assert!(snapshot.capabilities.sort);
    assert!(!snapshot.capabilities.bulk);
}

#[tokio::test]
async fn missing_config_endpoint_falls_open_to_all_supported() {
    let mut server = FakeScimServer::new();
    server.provider_config = None;

    let snapshot = Capabilities::discover(&server, BASE_URL).await;
    assert_eq!(snapshot.capabilities, Capabilities::all_supported());
}

#[tokio::test]
async fn undecodable_config_falls_open_to_all_supported() {
    let mut server = FakeScimServer::new();
    server.provider_config = Some("this is not json".to_string());

    let snapshot = Capabilities::discover(&server, BASE_URL).await;
    assert_eq!(snapshot.capabilities, Capabilities::all_supported());
}

#[tokio::test]
async fn unreachable_target_falls_open_to_all_supported() {
    let mut server = FakeScimServer::new();
    server.refuse_connections = true;

    let snapshot = Capabilities::discover(&server, BASE_URL).await;
    assert_eq!(snapshot.capabilities, Capabilities::all_supported());
}

#[tokio::test]
async fn partial_seeding_failure_rolls_back_created_users() {
    let mut server = FakeScimServer::new();
    server.fail_after_creates = Some(2);

    let fixtures = FixtureManager::new(&server, BASE_URL);
    let err = fixtures
        .create_users(FixtureCount::Many, "seeding test")
        .await
        .unwrap_err();
    assert_eq!(err.context, "seeding test");

    // The two users created before the quota hit were rolled back.
    assert_eq!(server.live_users(), 0);
}

#[tokio::test]
async fn seeded_fixtures_round_trip_through_create_and_delete() {
    let server = FakeScimServer::new();
    let fixtures = FixtureManager::new(&server, BASE_URL);

    let user_ids = fixtures
        .create_users(FixtureCount::Many, "lifecycle test")
        .await
        .unwrap();
    assert_eq!(user_ids.len(), 5);
    assert_eq!(server.live_users(), 5);

    let group_ids = fixtures
        .create_groups(&user_ids, FixtureCount::Many, "lifecycle test")
        .await
        .unwrap();
    assert_eq!(group_ids.len(), 4);

    for id in &group_ids {
        fixtures.delete_group(id, "lifecycle test").await.unwrap();
    }
    for id in &user_ids {
        fixtures.delete_user(id, "lifecycle test").await.unwrap();
    }
    assert_eq!(server.leaked_resources(), 0);
}
