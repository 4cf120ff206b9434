//! Fixture payloads and lifecycle management.
//!
//! Fixture resources exist only to exercise test cases. Every id returned by
//! a `create_*` call is owned by the runner invocation that requested it and
//! must be deleted before that invocation returns; the manager itself rolls
//! back partially seeded batches so a failed setup leaves no orphans behind.

use crate::client::{Verb, WireClient, WireRequest};
use crate::codec::{Resource, ResourceKind};
use crate::error::FixtureError;
use crate::outcome::{TestResult, Verdict, WireTrace};

/// How many fixtures a test method seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureCount {
    One,
    Many,
}

// Predefined user payloads. The five loginUser1..loginUser5 users back the
// list/filter/search scenarios; loginUser backs the single-fixture verbs.

pub const USER_LOGIN: &str = r#"{"name":{"givenName":"Kim","familyName":"Berry"},"password": "7019asd84","userName": "loginUser","emails":[{"value": "kim@example.com","type": "work","primary": true },{"value": "kim@jensen.org","type": "home"}], "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {"employeeNumber": "1234A","manager": {"value": "Taylor"}}}"#;

pub const USER_LOGIN_1: &str = r#"{"name":{"givenName":"Samindra","familyName":"Perera"},"password": "7019asd84","userName": "loginUser1","emails":[{"value": "Samindra@example.com","type": "work","primary": true },{"value": "Samindra@jensen.org","type": "home"}], "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {"employeeNumber": "12345","manager": {"value": "Taylor"}}}"#;

pub const USER_LOGIN_2: &str = r#"{"name":{"givenName":"Danny","familyName":"Gomez"},"password": "7019asd84","userName": "loginUser2","emails":[{"value": "danny@example.com","type": "work","primary": true },{"value": "danny@jensen.org","type": "home"}], "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {"employeeNumber": "243","manager": {"value": "Taylor"}}}"#;

pub const USER_LOGIN_3: &str = r#"{"name":{"givenName":"Jason","familyName":"Diesel"},"password": "7019asd84","userName": "loginUser3","emails":[{"value": "json@example.com","type": "work","primary": true },{"value": "json@jensen.org","type": "home"}], "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {"employeeNumber": "534","manager": {"value": "Taylor"}}}"#;

pub const USER_LOGIN_4: &str = r#"{"name":{"givenName":"Tom","familyName":"Hardy"},"password": "7019asd84","userName": "loginUser4","emails":[{"value": "tom@example.com","type": "work","primary": true },{"value": "tom@jensen.org","type": "home"}], "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {"employeeNumber": "343","manager": {"value": "Taylor"}}}"#;

pub const USER_LOGIN_5: &str = r#"{"name":{"givenName":"Taylor","familyName":"Swift"},"password": "7019asd84","userName": "loginUser5","emails":[{"value": "taylorn@example.com","type": "work","primary": true },{"value": "taylor@jensen.org","type": "home"}], "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {"employeeNumber": "536","manager": {"value": "Taylor"}}}"#;

/// Missing the required `userName`; drives the 400 create case.
pub const USER_WITHOUT_USER_NAME: &str = r#"{"name":{"givenName":"Samindra","familyName":"Perera"},"password": "7019asd84","emails":[{"value": "Samindra@example.com","type": "work","primary": true },{"value": "Samindra@jensen.org","type": "home"}], "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {"employeeNumber": "12345A","manager": {"value": "Taylor"}}}"#;

/// Full-resource replacement that keeps `userName` unchanged.
pub const USER_UPDATED: &str = r#"{"name":{"givenName":"Kims","familyName":"Berry"},"password": "7019asd85","userName": "loginUser","emails":[{"value": "kim@example.com","type": "work","primary": true },{"value": "kim@jensen.org","type": "home"}], "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {"employeeNumber": "1234A","manager": {"value": "Taylor"}}}"#;

/// Replacement that mutates the immutable `userName`; drives the 400 put case.
pub const USER_UPDATED_SCHEMA_VIOLATION: &str = r#"{"name":{"givenName":"Kimi","familyName":"Berry"},"password": "7019asd85","userName": "loginUserUpdated","emails":[{"value": "kimi@example.com","type": "work","primary": true },{"value": "kim@example.org","type": "home"}], "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {"employeeNumber": "1234A","manager": {"value": "Taylor"}}}"#;

// PatchOp bodies for the user patch scenarios, one per catalog case.

pub const PATCH_USER_ADD: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{"op":"add","value":{"nickName":"shaggy"}}]}"#;

pub const PATCH_USER_REMOVE: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{"op":"remove","path":"emails[type eq \"work\" and value ew \"example.com\"]"}]}"#;

pub const PATCH_USER_REPLACE: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{"op":"replace","path":"emails[type eq \"home\"]","value":{"type":"home","value":"home@example.com"}}]}"#;

pub const PATCH_USER_ARRAY: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{"op":"add","value":{"nickName":"shaggy"}},{"op":"remove","path":"emails[type eq \"work\" and value ew \"example.com\""},{"op":"replace","path":"emails[type eq \"home\"]","value":{"type":"home","value":"anjana@anjana.com"}}]}"#;

/// `remove` without a `path`; drives the 400 patch case.
pub const PATCH_USER_REMOVE_WITHOUT_PATH: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{"op":"remove","value":{"nickName":"shaggy"}}]}"#;

pub const PATCH_USER_ENTERPRISE: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{"op":"add","path":"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:manager","value":{"value":"Civil"}},{"op":"replace","path":"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:manager","value":{"value":"Civil-sub"}},{"op":"remove","path":"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:manager"}]}"#;

// SearchRequest bodies (POST /Users/.search).

pub const SEARCH_USERS_PAGINATED: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:SearchRequest"],"attributes":["name.familyName","userName"],"filter":"userName sw \"login\"","startIndex":1,"count":10}"#;

/// `ssw` is not a SCIM operator; drives the 400 search case.
pub const SEARCH_USERS_INVALID_FILTER: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:SearchRequest"],"attributes":["name.familyName","userName"],"filter":"userName ssw \"login\"","startIndex":1,"count":10}"#;

pub const SEARCH_USERS_UNPAGINATED: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:SearchRequest"],"attributes":["name.familyName","userName"],"filter":"userName sw \"login\""}"#;

pub const SEARCH_USERS_INDEX_ONLY: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:SearchRequest"],"attributes":["name.familyName","userName"],"filter":"userName sw \"login\"","startIndex":1}"#;

// SearchRequest bodies (POST /Groups/.search). XwLtOP23 is unique, so the
// expected totalResults is exactly 1.

pub const SEARCH_GROUPS_PAGINATED: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:SearchRequest"],"startIndex":1,"count":10,"filter":"displayName eq \"XwLtOP23\""}"#;

pub const SEARCH_GROUPS_INVALID_FILTER: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:SearchRequest"],"startIndex":1,"count":10,"filter":"displayName esq \"XwLtOP23\""}"#;

pub const SEARCH_GROUPS_UNPAGINATED: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:SearchRequest"],"filter":"displayName eq \"XwLtOP23\""}"#;

pub const SEARCH_GROUPS_INDEX_ONLY: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:SearchRequest"],"startIndex":1,"filter":"displayName eq \"XwLtOP23\""}"#;

/// Duplicate of the seeded member-bearing group's displayName.
pub const GROUP_DUPLICATE_DISPLAY_NAME: &str = r#"{"displayName": "XwLtOP23"}"#;

/// Empty body; drives the 400 group create case.
pub const GROUP_WITHOUT_DISPLAY_NAME: &str = "";

/// Replacement group renaming to XwLtOP23-Updated with five member displays.
pub const GROUP_UPDATED: &str = r#"{"displayName": "XwLtOP23-Updated","members": [{"display": "loginUser1"},{"display": "loginUser2"},{"display": "loginUser3"},{"display": "loginUser4"},{"display": "loginUser5"}]}"#;

/// Misspelled attribute name; drives the 400 group put case.
pub const GROUP_UPDATED_SCHEMA_VIOLATION: &str = r#"{"displaayName": "XwLtOP23-Updated"}"#;

pub const GROUP_UPDATED_NON_EXISTING: &str = r#"{"displayName": "XwLtOP23-UpdatedWithNonExistingId"}"#;

/// Plain group payloads for list/filter scenarios.
pub const PLAIN_GROUP_DISPLAY_NAMES: [&str; 3] = ["EYtXcD21", "BktqER22", "ZwLtOP23"];

/// The member-bearing group payload, templated with a seeded user id.
pub fn group_with_member(member_id: &str) -> String {
    format!(
        r#"{{"schemas":["urn:ietf:params:scim:schemas:core:2.0:Group"],"displayName":"XwLtOP23","members":[{{"value":"{member_id}","display":"loginUser"}}]}}"#
    )
}

fn plain_group(display_name: &str) -> String {
    format!(r#"{{"displayName": "{display_name}"}}"#)
}

/// Creates and tears down fixture users/groups against the target.
///
/// Every call is one real round trip with no retries; a single failure
/// aborts seeding or teardown for the enclosing invocation.
pub struct FixtureManager<'a, C: WireClient> {
    client: &'a C,
    base_url: String,
}

impl<'a, C: WireClient> FixtureManager<'a, C> {
    pub fn new(client: &'a C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn resource_url(&self, kind: ResourceKind) -> String {
        format!("{}{}", self.base_url, kind.endpoint())
    }

    /// Seed one (`One`) or five (`Many`) predefined users; ids in creation order.
    pub async fn create_users(
        &self,
        count: FixtureCount,
        context: &str,
    ) -> Result<Vec<String>, FixtureError> {
        let payloads: Vec<&str> = match count {
            FixtureCount::One => vec![USER_LOGIN],
            FixtureCount::Many => vec![
                USER_LOGIN_1,
                USER_LOGIN_2,
                USER_LOGIN_3,
                USER_LOGIN_4,
                USER_LOGIN_5,
            ],
        };
        self.create_batch(ResourceKind::User, payloads.into_iter().map(String::from), context)
            .await
    }

    /// Seed groups, templating the member-bearing payload with `member_ids`.
    ///
    /// `One` seeds the XwLtOP23 group holding the first member id; `Many`
    /// additionally seeds the three plain groups first.
    pub async fn create_groups(
        &self,
        member_ids: &[String],
        count: FixtureCount,
        context: &str,
    ) -> Result<Vec<String>, FixtureError> {
        let member = member_ids.first().map(String::as_str).unwrap_or_default();
        let payloads: Vec<String> = match count {
            FixtureCount::One => vec![group_with_member(member)],
            FixtureCount::Many => PLAIN_GROUP_DISPLAY_NAMES
                .iter()
                .map(|name| plain_group(name))
                .chain(std::iter::once(group_with_member(member)))
                .collect(),
        };
        self.create_batch(ResourceKind::Group, payloads.into_iter(), context)
            .await
    }

    pub async fn delete_user(&self, id: &str, context: &str) -> Result<(), FixtureError> {
        self.delete_resource(ResourceKind::User, id, context).await
    }

    pub async fn delete_group(&self, id: &str, context: &str) -> Result<(), FixtureError> {
        self.delete_resource(ResourceKind::Group, id, context).await
    }

    async fn create_batch(
        &self,
        kind: ResourceKind,
        payloads: impl Iterator<Item = String>,
        context: &str,
    ) -> Result<Vec<String>, FixtureError> {
        let mut ids = Vec::new();
        for payload in payloads {
            match self.create_one(kind, &payload, context).await {
                Ok(id) => ids.push(id),
                Err(err) => {
                    self.rollback(kind, &ids, context).await;
                    return Err(err);
                }
            }
        }
        Ok(ids)
    }

    async fn create_one(
        &self,
        kind: ResourceKind,
        payload: &str,
        context: &str,
    ) -> Result<String, FixtureError> {
        let url = self.resource_url(kind);
        let request = WireRequest::with_body(Verb::Post, &url, payload);
        let mut trace = WireTrace::for_request(&request);
        let started = std::time::Instant::now();

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                return Err(self.seeding_failure(
                    context,
                    trace,
                    started,
                    format!("Could not create default {} at url {url}: {err}", kind.plural()),
                ));
            }
        };
        trace.record_response(&response);

        if response.status != 201 {
            return Err(self.seeding_failure(
                context,
                trace,
                started,
                format!(
                    "Could not create default {} at url {url}: status {}",
                    kind.plural(),
                    response.status
                ),
            ));
        }
        let id = Resource::decode(kind, &response.body)
            .and_then(|resource| resource.require_id().map(str::to_string))
            .map_err(|err| {
                self.seeding_failure(
                    context,
                    trace.clone(),
                    started,
                    format!(
                        "Could not decode the server response of {} create: {err}",
                        kind.plural()
                    ),
                )
            })?;
        Ok(id)
    }

    async fn delete_resource(
        &self,
        kind: ResourceKind,
        id: &str,
        context: &str,
    ) -> Result<(), FixtureError> {
        let url = format!("{}/{}", self.resource_url(kind), id);
        let request = WireRequest::delete(&url);
        let mut trace = WireTrace::for_request(&request);
        let started = std::time::Instant::now();

        match self.client.execute(request).await {
            Ok(response) if response.status == 204 => Ok(()),
            Ok(response) => {
                trace.record_response(&response);
                Err(self.seeding_failure(
                    context,
                    trace,
                    started,
                    format!(
                        "Could not delete the default {} at url {url}: status {}",
                        kind.name().to_lowercase(),
                        response.status
                    ),
                ))
            }
            Err(err) => Err(self.seeding_failure(
                context,
                trace,
                started,
                format!(
                    "Could not delete the default {} at url {url}: {err}",
                    kind.name().to_lowercase()
                ),
            )),
        }
    }

    /// Best-effort removal of already-created ids after a partial seeding
    /// failure. Cleanup failure here is a known residual risk; it is logged,
    /// not propagated, so the original seeding error stays the cause.
    async fn rollback(&self, kind: ResourceKind, ids: &[String], context: &str) {
        for id in ids {
            if let Err(err) = self.delete_resource(kind, id, context).await {
                log::warn!("fixture rollback of {} {id} failed: {err}", kind.name());
            }
        }
    }

    fn seeding_failure(
        &self,
        context: &str,
        trace: WireTrace,
        started: std::time::Instant,
        message: String,
    ) -> FixtureError {
        let result = TestResult::new(
            Verdict::Error,
            context,
            message,
            trace,
            started.elapsed().as_millis() as u64,
        );
        FixtureError::new(context, result)
    }
}
