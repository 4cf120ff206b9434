//! Per-verb test-case catalogs.
//!
//! Each builder returns the ordered list of cases a runner method walks. A
//! case is pure data: the URL suffix or request body, the capability-resolved
//! `expected_supported` flag and a typed scenario assertion. The runner owns
//! fixture lifecycles and verdict classification; nothing here performs I/O.

use uuid::Uuid;

use crate::capabilities::Capabilities;
use crate::codec::{ENTERPRISE_USER_URN, ResourceKind};
use crate::fixtures;

/// Scenario-specific check a case carries beyond the baseline status,
/// decode and schema validation steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionKind {
    /// Baseline checks only.
    None,
    /// Every seeded fixture must appear in the returned list.
    AllResourcesPresent,
    /// Every returned resource's filter attribute must equal `value`.
    FilterEquals { value: &'static str },
    /// No returned resource's filter attribute may equal `value`.
    FilterNotEquals { value: &'static str },
    /// The page must start at `start_index` and hold exactly `count` items.
    PageSize { start_index: i64, count: usize },
    /// Without an explicit index the page starts at 1 and holds `count` items.
    DefaultStartIndex { count: usize },
    /// Returned resources must be in ascending id order.
    SortedAscending,
    /// Filter match plus an exact page size.
    FilterWithPagination { value: &'static str, count: usize },
    /// The projected filter attribute must be present on each resource.
    ProjectedAttributes,
    /// The named attribute must be absent from each resource.
    ExcludedAttribute { attribute: &'static str },
    /// The list envelope's `totalResults` must equal this value.
    TotalResultsEquals(i64),
    /// The case passes when the target answers with this error status;
    /// `message` is the verdict text recorded on that success.
    ExpectedErrorStatus {
        status: u16,
        message: &'static str,
    },
}

/// One catalog entry.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: &'static str,
    /// Appended verbatim to the request URL (query string or id garbling).
    pub suffix: String,
    /// JSON body for verbs that send one.
    pub body: Option<String>,
    /// Resolved from the capability snapshot; `false` downgrades any
    /// failure of this case to `SKIPPED`.
    pub expected_supported: bool,
    pub assertion: AssertionKind,
}

impl TestCase {
    fn new(name: &'static str, suffix: impl Into<String>, assertion: AssertionKind) -> Self {
        Self {
            name,
            suffix: suffix.into(),
            body: None,
            expected_supported: true,
            assertion,
        }
    }

    fn with_body(
        name: &'static str,
        body: impl Into<String>,
        assertion: AssertionKind,
    ) -> Self {
        Self {
            name,
            suffix: String::new(),
            body: Some(body.into()),
            expected_supported: true,
            assertion,
        }
    }

    fn gated(mut self, supported: bool) -> Self {
        self.expected_supported = supported;
        self
    }

    fn at(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}

// Success-verdict texts for the expected-error cases. The wording differs
// per verb: create/get qualify the status, patch/put/delete/search do not.
const ERROR_404_MESSAGE: &str = "Server successfully given the expected error 404 message";
const ERROR_409_CONFLICT: &str = "Server successfully given the expected error 409(conflict) message";
const ERROR_400_PROVIDER: &str = "Service Provider successfully given the expected error 400";
const ERROR_400_SEARCH: &str =
    "Service Provider successfully given the expected error 400 message";

/// An id fragment no server-assigned id collides with.
fn nonexistent_id() -> String {
    Uuid::new_v4().to_string()
}

/// List-GET catalog for `/Users` or `/Groups`.
pub fn list_cases(kind: ResourceKind, caps: &Capabilities) -> Vec<TestCase> {
    match kind {
        ResourceKind::User => vec![
            TestCase::new("List Users", "", AssertionKind::AllResourcesPresent),
            TestCase::new(
                "List users with specified resource attributes to return",
                "?attributes=userName,name.givenName",
                AssertionKind::None,
            ),
            TestCase::new(
                "List users excluding attributes givenName and emails",
                "?excludedAttributes=name.givenName,emails",
                AssertionKind::None,
            ),
            TestCase::new(
                "Sort users by user id without pagination and filtering params",
                "?sortBy=id&sortOrder=ascending",
                AssertionKind::SortedAscending,
            )
            .gated(caps.sort),
            TestCase::new(
                "List users with pagination",
                "?startIndex=1&count=2",
                AssertionKind::PageSize {
                    start_index: 1,
                    count: 2,
                },
            ),
            TestCase::new(
                "Paginate users with a negative startIndex",
                "?startIndex=-1&count=2",
                AssertionKind::PageSize {
                    start_index: 1,
                    count: 2,
                },
            ),
            TestCase::new(
                "Paginate users without startIndex and with positive count param",
                "?count=2",
                AssertionKind::DefaultStartIndex { count: 2 },
            ),
            TestCase::new(
                "Paginate users with positive startIndex and without count param",
                "?startIndex=1",
                AssertionKind::AllResourcesPresent,
            ),
            TestCase::new(
                "List users by filtering - userName eq",
                "?filter=userName+eq+%22loginUser1%22",
                AssertionKind::FilterEquals {
                    value: "loginUser1",
                },
            )
            .gated(caps.filter),
            TestCase::new(
                "Filter users by username with pagination params",
                "?filter=userName+eq+%22loginUser1%22&startIndex=1&count=1",
                AssertionKind::FilterWithPagination {
                    value: "loginUser1",
                    count: 1,
                },
            )
            .gated(caps.filter),
            TestCase::new(
                "List users by filtering - userName eq with only using startIndex",
                "?filter=userName+eq+%22loginUser1%22&startIndex=1",
                AssertionKind::FilterEquals {
                    value: "loginUser1",
                },
            )
            .gated(caps.filter),
            TestCase::new(
                "List users by filtering - userName eq to check case insensitivity of attribute",
                "?filter=USERNAME+eq+%22loginUser1%22",
                AssertionKind::FilterEquals {
                    value: "loginUser1",
                },
            )
            .gated(caps.filter),
            TestCase::new(
                "List users by filtering - userName eq to check case insensitivity of operator",
                "?filter=userName+EQ+%22loginUser1%22",
                AssertionKind::FilterEquals {
                    value: "loginUser1",
                },
            )
            .gated(caps.filter),
            TestCase::new(
                "List users by filtering - userName ne",
                "?filter=userName+ne+%22loginUser1%22",
                AssertionKind::FilterNotEquals {
                    value: "loginUser1",
                },
            )
            .gated(caps.filter),
            TestCase::new(
                "List users by filtering - userName co",
                "?filter=userName+co+%22loginUser1%22",
                AssertionKind::FilterEquals {
                    value: "loginUser1",
                },
            )
            .gated(caps.filter),
            TestCase::new(
                "List users by filtering - userName sw",
                "?filter=userName+sw+%22loginUser1%22",
                AssertionKind::FilterEquals {
                    value: "loginUser1",
                },
            )
            .gated(caps.filter),
            TestCase::new(
                "List users by filtering - userName ew",
                "?filter=userName+ew+%22ginUser1%22",
                AssertionKind::FilterEquals {
                    value: "loginUser1",
                },
            )
            .gated(caps.filter),
            TestCase::new(
                "List users by filtering - userName pr",
                "?filter=userName+pr",
                AssertionKind::AllResourcesPresent,
            )
            .gated(caps.filter),
        ],
        ResourceKind::Group => vec![
            TestCase::new("List groups", "", AssertionKind::AllResourcesPresent),
            TestCase::new(
                "Get groups with displayName and member.value attributes",
                "?attributes=displayName,members.value",
                AssertionKind::None,
            ),
            TestCase::new(
                "Get groups with excluding members attribute",
                "?excludedAttributes=members",
                AssertionKind::None,
            ),
            TestCase::new(
                "Get groups with group id sorting and ascending order",
                "?sortBy=id&sortOrder=ascending",
                AssertionKind::SortedAscending,
            )
            .gated(caps.sort),
            TestCase::new(
                "Get groups with index pagination and count",
                "?startIndex=1&count=2",
                AssertionKind::PageSize {
                    start_index: 1,
                    count: 2,
                },
            ),
            TestCase::new(
                "Get groups having negative number as index",
                "?startIndex=-1&count=2",
                AssertionKind::PageSize {
                    start_index: 1,
                    count: 2,
                },
            ),
            TestCase::new(
                "Get groups without index and only using count",
                "?count=2",
                AssertionKind::DefaultStartIndex { count: 2 },
            ),
            TestCase::new(
                "List groups with only using startIndex",
                "?startIndex=1",
                AssertionKind::AllResourcesPresent,
            ),
            TestCase::new(
                "Get groups with displayName as filter and with pagination",
                "?filter=displayName+eq+%22EYtXcD21%22&startIndex=1&count=1",
                AssertionKind::FilterWithPagination {
                    value: "EYtXcD21",
                    count: 1,
                },
            )
            .gated(caps.filter),
            TestCase::new(
                "Get groups with displayName as filter",
                "?filter=displayName+eq+%22EYtXcD21%22",
                AssertionKind::FilterEquals { value: "EYtXcD21" },
            )
            .gated(caps.filter),
            TestCase::new(
                "List groups by filtering - displayName eq with only using startIndex",
                "?filter=displayName+eq+%22EYtXcD21%22&startIndex=1",
                AssertionKind::FilterEquals { value: "EYtXcD21" },
            )
            .gated(caps.filter),
            TestCase::new(
                "List groups by filtering - displayName eq to check case insensitivity of attribute",
                "?filter=DISPLAYNAME+eq+%22EYtXcD21%22",
                AssertionKind::FilterEquals { value: "EYtXcD21" },
            )
            .gated(caps.filter),
            TestCase::new(
                "List groups by filtering - displayName eq to check case insensitivity of operator",
                "?filter=displayName+EQ+%22EYtXcD21%22",
                AssertionKind::FilterEquals { value: "EYtXcD21" },
            )
            .gated(caps.filter),
            TestCase::new(
                "List groups by filtering - displayName ne",
                "?filter=displayName+ne+%22EYtXcD21%22",
                AssertionKind::FilterNotEquals { value: "EYtXcD21" },
            )
            .gated(caps.filter),
            TestCase::new(
                "List groups by filtering - displayName co",
                "?filter=displayName+co+%22EYtXcD21%22",
                AssertionKind::FilterEquals { value: "EYtXcD21" },
            )
            .gated(caps.filter),
            TestCase::new(
                "List groups by filtering - displayName sw",
                "?filter=displayName+sw+%22EYtXcD21%22",
                AssertionKind::FilterEquals { value: "EYtXcD21" },
            )
            .gated(caps.filter),
            TestCase::new(
                "List groups by filtering - displayName ew",
                "?filter=displayName+ew+%22EYtXcD21%22",
                AssertionKind::FilterEquals { value: "EYtXcD21" },
            )
            .gated(caps.filter),
            TestCase::new(
                "List groups by filtering - displayName pr",
                "?filter=displayName+pr",
                AssertionKind::AllResourcesPresent,
            )
            .gated(caps.filter),
        ],
    }
}

/// GET-by-id catalog. The nonexistent-id cases append a fresh UUID to the
/// fixture's real id, which reliably misses.
pub fn get_by_id_cases(kind: ResourceKind) -> Vec<TestCase> {
    match kind {
        ResourceKind::User => vec![
            TestCase::new("Get user by ID", "", AssertionKind::None),
            TestCase::new(
                "Get a user with specific attributes userName and givenName",
                "?attributes=userName,name.givenName",
                AssertionKind::ProjectedAttributes,
            ),
            TestCase::new(
                "Get a non existing user and validate user not found error response",
                nonexistent_id(),
                AssertionKind::ExpectedErrorStatus {
                    status: 404,
                    message: "Server successfully given the expected error 404(User not found in \
                              the user store) message",
                },
            ),
            TestCase::new(
                "Get a enterprise user with excluding attribute employeeNumber",
                format!("?excludedAttributes={ENTERPRISE_USER_URN}:employeeNumber"),
                AssertionKind::ExcludedAttribute {
                    attribute: "employeeNumber",
                },
            ),
        ],
        ResourceKind::Group => vec![
            TestCase::new("Get group by ID", "", AssertionKind::None),
            TestCase::new(
                "Get a group with specific attributes",
                "?attributes=displayName,members.value",
                AssertionKind::ProjectedAttributes,
            ),
            TestCase::new(
                "Get a group with excluding members attribute",
                "?excludedAttributes=members",
                AssertionKind::ExcludedAttribute {
                    attribute: "members",
                },
            ),
            TestCase::new(
                "Get group with non existing ID and validate group not found error response",
                nonexistent_id(),
                AssertionKind::ExpectedErrorStatus {
                    status: 404,
                    message: "Server successfully given the expected error 404(Group not found in \
                              the user store) message",
                },
            ),
        ],
    }
}

/// POST-create catalog. The group payloads reference a seeded member user.
pub fn create_cases(kind: ResourceKind, member_ids: &[String]) -> Vec<TestCase> {
    match kind {
        ResourceKind::User => vec![
            TestCase::with_body("Create User", fixtures::USER_LOGIN_1, AssertionKind::None),
            TestCase::with_body(
                "Create User with existing userName",
                fixtures::USER_LOGIN_1,
                AssertionKind::ExpectedErrorStatus {
                    status: 409,
                    message: ERROR_409_CONFLICT,
                },
            ),
            TestCase::with_body(
                "Create User without userName",
                fixtures::USER_WITHOUT_USER_NAME,
                AssertionKind::ExpectedErrorStatus {
                    status: 400,
                    message: "Server successfully given the expected error 400(Required attribute \
                              userName is missing in the SCIM Object) message",
                },
            ),
        ],
        ResourceKind::Group => {
            let member = member_ids.first().map(String::as_str).unwrap_or_default();
            vec![
                TestCase::with_body(
                    "Create group",
                    fixtures::group_with_member(member),
                    AssertionKind::None,
                ),
                TestCase::with_body(
                    "Create group with existing displayName",
                    fixtures::GROUP_DUPLICATE_DISPLAY_NAME,
                    AssertionKind::ExpectedErrorStatus {
                        status: 409,
                        message: ERROR_409_CONFLICT,
                    },
                ),
                TestCase::with_body(
                    "Create group without displayName",
                    fixtures::GROUP_WITHOUT_DISPLAY_NAME,
                    AssertionKind::ExpectedErrorStatus {
                        status: 400,
                        message: "Server successfully given the expected error 400(Required \
                                  attribute displayName is missing in the SCIM Object) message",
                    },
                ),
            ]
        }
    }
}

/// PATCH catalog; every case is gated on the `patch` capability.
pub fn patch_cases(
    kind: ResourceKind,
    caps: &Capabilities,
    member_ids: &[String],
    base_url: &str,
) -> Vec<TestCase> {
    match kind {
        ResourceKind::User => vec![
            TestCase::with_body(
                "Patch User with add operation",
                fixtures::PATCH_USER_ADD,
                AssertionKind::None,
            )
            .gated(caps.patch),
            TestCase::with_body(
                "Patch User with remove operation",
                fixtures::PATCH_USER_REMOVE,
                AssertionKind::None,
            )
            .gated(caps.patch),
            TestCase::with_body(
                "Patch User with replace operation",
                fixtures::PATCH_USER_REPLACE,
                AssertionKind::None,
            )
            .gated(caps.patch),
            TestCase::with_body(
                "Patch User with array of operations",
                fixtures::PATCH_USER_ARRAY,
                AssertionKind::None,
            )
            .gated(caps.patch),
            TestCase::with_body(
                "Patch User - remove attribute without defining a path",
                fixtures::PATCH_USER_REMOVE_WITHOUT_PATH,
                AssertionKind::ExpectedErrorStatus {
                    status: 400,
                    message: ERROR_400_PROVIDER,
                },
            )
            .gated(caps.patch),
            TestCase::with_body(
                "Patch Enterprise User with array of operations",
                fixtures::PATCH_USER_ENTERPRISE,
                AssertionKind::None,
            )
            .gated(caps.patch),
            TestCase::with_body(
                "Patch non existing user with array of operations",
                fixtures::PATCH_USER_ARRAY,
                AssertionKind::ExpectedErrorStatus {
                    status: 404,
                    message: ERROR_404_MESSAGE,
                },
            )
            .at(nonexistent_id())
            .gated(caps.patch),
        ],
        ResourceKind::Group => {
            let member = member_ids.first().map(String::as_str).unwrap_or_default();
            let member_ref = format!("{base_url}/Users/{member}");
            vec![
                TestCase::with_body(
                    "Patch group with add operation",
                    r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{"op":"add","value":{"displayName": "XwLtOP23-patch"}}]}"#,
                    AssertionKind::None,
                )
                .gated(caps.patch),
                TestCase::with_body(
                    "Patch group with remove operation",
                    r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{"op":"remove","path":"members"}]}"#,
                    AssertionKind::None,
                )
                .gated(caps.patch),
                TestCase::with_body(
                    "Patch group with replace operation",
                    format!(
                        r#"{{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{{"op":"replace","value":{{"members":[{{"display":"loginUser1","value":"{member}","$ref":"{member_ref}"}}]}}}}]}}"#
                    ),
                    AssertionKind::None,
                )
                .gated(caps.patch),
                TestCase::with_body(
                    "Patch group with array of operations",
                    format!(
                        r#"{{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{{"op":"remove","path":"members"}},{{"op":"add","path":"members","value":[{{"display":"loginUser1","value":"{member}"}}]}},{{"op":"replace","path":"members","value":[{{"display":"loginUser1","value":"{member}","$ref":"{member_ref}"}}]}}]}}"#
                    ),
                    AssertionKind::None,
                )
                .gated(caps.patch),
                TestCase::with_body(
                    "Patch group and validate error response",
                    r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{"op":"remove"}]}"#,
                    AssertionKind::ExpectedErrorStatus {
                        status: 400,
                        message: ERROR_400_PROVIDER,
                    },
                )
                .gated(caps.patch),
                TestCase::with_body(
                    "Patch non existing group",
                    r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{"op":"add","value":{"displayName": "XwLtOP23-patchNonExistingGroup"}}]}"#,
                    AssertionKind::ExpectedErrorStatus {
                        status: 404,
                        message: ERROR_404_MESSAGE,
                    },
                )
                .at(nonexistent_id())
                .gated(caps.patch),
            ]
        }
    }
}

/// PUT-replace catalog.
pub fn update_cases(kind: ResourceKind) -> Vec<TestCase> {
    match kind {
        ResourceKind::User => vec![
            TestCase::with_body("Update User", fixtures::USER_UPDATED, AssertionKind::None),
            TestCase::with_body(
                "Update user with schema violation",
                fixtures::USER_UPDATED_SCHEMA_VIOLATION,
                AssertionKind::ExpectedErrorStatus {
                    status: 400,
                    message: ERROR_400_PROVIDER,
                },
            ),
            TestCase::with_body(
                "Update non existing user and and verify Http status code",
                fixtures::USER_UPDATED,
                AssertionKind::ExpectedErrorStatus {
                    status: 404,
                    message: ERROR_404_MESSAGE,
                },
            )
            .at(nonexistent_id()),
        ],
        ResourceKind::Group => vec![
            TestCase::with_body("Update Group", fixtures::GROUP_UPDATED, AssertionKind::None),
            TestCase::with_body(
                "Update group with schema violation to validate error response",
                fixtures::GROUP_UPDATED_SCHEMA_VIOLATION,
                AssertionKind::ExpectedErrorStatus {
                    status: 400,
                    message: ERROR_400_PROVIDER,
                },
            ),
            TestCase::with_body(
                "Update non existing group and and verify Http status code",
                fixtures::GROUP_UPDATED_NON_EXISTING,
                AssertionKind::ExpectedErrorStatus {
                    status: 404,
                    message: ERROR_404_MESSAGE,
                },
            )
            .at(nonexistent_id()),
        ],
    }
}

/// DELETE catalog. The delete-twice case reuses the same fixture id; the
/// runner issues the second delete against the already-removed resource.
pub fn delete_cases(kind: ResourceKind) -> Vec<TestCase> {
    match kind {
        ResourceKind::User => vec![
            TestCase::new("Delete user by ID", "", AssertionKind::None),
            TestCase::new(
                "Delete user twice and verify Http status code",
                "",
                AssertionKind::ExpectedErrorStatus {
                    status: 404,
                    message: ERROR_404_MESSAGE,
                },
            ),
            TestCase::new(
                "Delete non existing user and validate user not found error response",
                nonexistent_id(),
                AssertionKind::ExpectedErrorStatus {
                    status: 404,
                    message: ERROR_404_MESSAGE,
                },
            ),
        ],
        ResourceKind::Group => vec![
            TestCase::new("Delete group by ID", "", AssertionKind::None),
            TestCase::new(
                "Delete group twice and verify Http status code",
                "",
                AssertionKind::ExpectedErrorStatus {
                    status: 404,
                    message: ERROR_404_MESSAGE,
                },
            ),
            TestCase::new(
                "Delete group with non existing ID and validate group not found error response",
                nonexistent_id(),
                AssertionKind::ExpectedErrorStatus {
                    status: 404,
                    message: ERROR_404_MESSAGE,
                },
            ),
        ],
    }
}

/// `POST /.search` catalog. With five `loginUser*` users and one unique
/// XwLtOP23 group seeded, the expected match counts are fixed.
pub fn search_cases(kind: ResourceKind) -> Vec<TestCase> {
    match kind {
        ResourceKind::User => vec![
            TestCase::with_body(
                "Search user with filter and pagination query parameters",
                fixtures::SEARCH_USERS_PAGINATED,
                AssertionKind::TotalResultsEquals(5),
            ),
            TestCase::with_body(
                "Search user with invalid filter",
                fixtures::SEARCH_USERS_INVALID_FILTER,
                AssertionKind::ExpectedErrorStatus {
                    status: 400,
                    message: ERROR_400_SEARCH,
                },
            ),
            TestCase::with_body(
                "Search user without pagination parameters",
                fixtures::SEARCH_USERS_UNPAGINATED,
                AssertionKind::TotalResultsEquals(5),
            ),
            TestCase::with_body(
                "Search user with index paging and without count parameter",
                fixtures::SEARCH_USERS_INDEX_ONLY,
                AssertionKind::TotalResultsEquals(5),
            ),
        ],
        ResourceKind::Group => vec![
            TestCase::with_body(
                "Search groups with displayName as filter and with pagination query parameters",
                fixtures::SEARCH_GROUPS_PAGINATED,
                AssertionKind::TotalResultsEquals(1),
            ),
            TestCase::with_body(
                "Search group with invalid filter",
                fixtures::SEARCH_GROUPS_INVALID_FILTER,
                AssertionKind::ExpectedErrorStatus {
                    status: 400,
                    message: ERROR_400_SEARCH,
                },
            ),
            TestCase::with_body(
                "Search group without pagination parameters",
                fixtures::SEARCH_GROUPS_UNPAGINATED,
                AssertionKind::TotalResultsEquals(1),
            ),
            TestCase::with_body(
                "Search group with index paging and without count parameter",
                fixtures::SEARCH_GROUPS_INDEX_ONLY,
                AssertionKind::TotalResultsEquals(1),
            ),
        ],
    }
}
