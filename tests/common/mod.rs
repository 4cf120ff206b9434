//! In-memory SCIM service provider used as the test target.
//!
//! Implements just enough of RFC 7644 over [`WireClient`] for the runner's
//! catalog to execute without a network: user/group CRUD, filtering,
//! pagination, sorting, `.search` and `/ServiceProviderConfig`. Behavior
//! knobs let individual tests script protocol violations.

// Each integration test binary compiles its own copy of this module and
// uses a different subset of it.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Value, json};

use scim_compliance::{TransportError, Verb, WireClient, WireRequest, WireResponse};

pub const BASE_URL: &str = "https://example.test/scim2";

/// Route `log` output into the test harness capture.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct State {
    users: BTreeMap<String, Value>,
    groups: BTreeMap<String, Value>,
    created: u64,
    deleted: u64,
}

/// Scripted SCIM target.
#[derive(Default)]
pub struct FakeScimServer {
    state: Mutex<State>,
    next_id: AtomicU64,
    /// Body served for `GET /ServiceProviderConfig`; `None` yields a 404.
    pub provider_config: Option<String>,
    /// Refuse every connection, as an unreachable host would.
    pub refuse_connections: bool,
    /// Answer filtered list requests with 501.
    pub reject_filtering: bool,
    /// Leave out one seeded user from list responses.
    pub drop_one_from_lists: bool,
    /// Serve list pages of this size regardless of the requested count.
    pub forced_page_size: Option<usize>,
    /// Fail creates with a 500 once this many resources have been created.
    pub fail_after_creates: Option<u64>,
    /// Keep the write-only password in create responses.
    pub leak_password_on_create: bool,
    /// Serve a wrong `Location` header on create responses.
    pub misplace_location_header: bool,
}

impl FakeScimServer {
    pub fn new() -> Self {
        Self {
            provider_config: Some(default_provider_config()),
            ..Self::default()
        }
    }

    pub fn live_users(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    pub fn live_groups(&self) -> usize {
        self.state.lock().unwrap().groups.len()
    }

    /// Creates minus deletes across both resource types.
    pub fn leaked_resources(&self) -> i64 {
        let state = self.state.lock().unwrap();
        state.created as i64 - state.deleted as i64
    }

    fn fresh_id(&self) -> String {
        // Zero-padded so lexicographic order equals creation order.
        format!("id-{:06}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn respond(&self, request: &WireRequest) -> WireResponse {
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .to_string();
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p.to_string(), q.to_string()),
            None => (path, String::new()),
        };

        match (request.verb, path.as_str()) {
            (Verb::Get, "/ServiceProviderConfig") => match &self.provider_config {
                Some(body) => ok_json(200, body.clone()),
                None => error_response(404, "No ServiceProviderConfig"),
            },
            (Verb::Get, "/Users") => self.list(Kind::User, &query),
            (Verb::Get, "/Groups") => self.list(Kind::Group, &query),
            (Verb::Post, "/Users") => self.create(Kind::User, request.body.as_deref()),
            (Verb::Post, "/Groups") => self.create(Kind::Group, request.body.as_deref()),
            (Verb::Post, "/Users/.search") => self.search(Kind::User, request.body.as_deref()),
            (Verb::Post, "/Groups/.search") => self.search(Kind::Group, request.body.as_deref()),
            (verb, _) if path.starts_with("/Users/") || path.starts_with("/Groups/") => {
                let kind = if path.starts_with("/Users/") {
                    Kind::User
                } else {
                    Kind::Group
                };
                let id = path
                    .rsplit_once('/')
                    .map(|(_, id)| id.to_string())
                    .unwrap_or_default();
                match verb {
                    Verb::Get => self.get_by_id(kind, &id, &query),
                    Verb::Patch => self.patch(kind, &id, request.body.as_deref()),
                    Verb::Put => self.replace(kind, &id, request.body.as_deref()),
                    Verb::Delete => self.delete(kind, &id),
                    Verb::Post => error_response(405, "Method not allowed"),
                }
            }
            _ => error_response(404, "No such endpoint"),
        }
    }

    fn create(&self, kind: Kind, body: Option<&str>) -> WireResponse {
        let Some(parsed) = body.and_then(|b| serde_json::from_str::<Value>(b).ok()) else {
            return error_response(400, "Request body is not valid JSON");
        };
        let key = kind.unique_attribute();
        let Some(unique) = parsed.get(key).and_then(Value::as_str).map(str::to_string) else {
            return error_response(400, &format!("Required attribute {key} is missing"));
        };

        let mut state = self.state.lock().unwrap();
        if let Some(limit) = self.fail_after_creates
            && state.created >= limit
        {
            return error_response(500, "Create quota exhausted");
        }
        let table = kind.table_mut(&mut state);
        if table
            .values()
            .any(|v| v.get(key).and_then(Value::as_str) == Some(unique.as_str()))
        {
            return error_response(409, &format!("{key} already exists"));
        }

        let id = self.fresh_id();
        let mut stored = parsed;
        if let Some(map) = stored.as_object_mut() {
            map.insert("id".to_string(), json!(id));
            map.insert("schemas".to_string(), json!([kind.schema_urn()]));
            map.insert("meta".to_string(), resource_meta(kind, &id));
            // Never store or return the password.
            if !self.leak_password_on_create {
                map.remove("password");
            }
        }
        table.insert(id.clone(), stored.clone());
        state.created += 1;
        drop(state);

        let mut response = ok_json(201, stored.to_string());
        let location = if self.misplace_location_header {
            format!("{BASE_URL}/nowhere/{id}")
        } else {
            canonical_location(kind, &id)
        };
        response.headers.push(("Location".to_string(), location));
        response
    }

    fn get_by_id(&self, kind: Kind, id: &str, query: &str) -> WireResponse {
        let state = self.state.lock().unwrap();
        let Some(stored) = kind.table(&state).get(id) else {
            return error_response(404, "Resource not found");
        };
        let mut body = stored.clone();
        drop(state);
        apply_projection(&mut body, kind, query);
        let mut response = ok_json(200, body.to_string());
        response
            .headers
            .push(("Location".to_string(), canonical_location(kind, id)));
        response
    }

    fn list(&self, kind: Kind, query: &str) -> WireResponse {
        let params = parse_query(query);
        if params.contains_key("filter") && self.reject_filtering {
            return error_response(501, "Filtering is not implemented");
        }

        let state = self.state.lock().unwrap();
        let mut resources: Vec<Value> = kind.table(&state).values().cloned().collect();
        drop(state);

        if self.drop_one_from_lists && !resources.is_empty() {
            resources.remove(0);
        }
        if let Some(filter) = params.get("filter") {
            if let Err(message) = apply_filter(&mut resources, kind, filter) {
                return error_response(400, &message);
            }
        }
        // Stored in id order already; explicit sortBy=id keeps it.
        let total = resources.len();
        let start_index = params
            .get("startIndex")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let skip = (start_index - 1) as usize;
        let mut page: Vec<Value> = resources.into_iter().skip(skip).collect();
        let count = self
            .forced_page_size
            .or_else(|| params.get("count").and_then(|v| v.parse::<usize>().ok()));
        if let Some(count) = count {
            page.truncate(count);
        }

        ok_json(200, list_envelope(total, start_index, &page).to_string())
    }

    fn search(&self, kind: Kind, body: Option<&str>) -> WireResponse {
        let Some(parsed) = body.and_then(|b| serde_json::from_str::<Value>(b).ok()) else {
            return error_response(400, "Request body is not valid JSON");
        };
        let state = self.state.lock().unwrap();
        let mut resources: Vec<Value> = kind.table(&state).values().cloned().collect();
        drop(state);

        if let Some(filter) = parsed.get("filter").and_then(Value::as_str) {
            if let Err(message) = apply_filter(&mut resources, kind, filter) {
                return error_response(400, &message);
            }
        }
        let total = resources.len();
        let start_index = parsed
            .get("startIndex")
            .and_then(Value::as_i64)
            .unwrap_or(1)
            .max(1);
        let mut page: Vec<Value> = resources
            .into_iter()
            .skip((start_index - 1) as usize)
            .collect();
        if let Some(count) = parsed.get("count").and_then(Value::as_u64) {
            page.truncate(count as usize);
        }
        ok_json(200, list_envelope(total, start_index, &page).to_string())
    }

    fn patch(&self, kind: Kind, id: &str, body: Option<&str>) -> WireResponse {
        let Some(parsed) = body.and_then(|b| serde_json::from_str::<Value>(b).ok()) else {
            return error_response(400, "Request body is not valid JSON");
        };
        let operations = parsed
            .get("Operations")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for op in &operations {
            let is_remove = op.get("op").and_then(Value::as_str) == Some("remove");
            if is_remove && op.get("path").is_none() {
                return error_response(400, "remove operation requires a path");
            }
        }
        let state = self.state.lock().unwrap();
        match kind.table(&state).get(id) {
            Some(stored) => {
                let mut response = ok_json(200, stored.to_string());
                response
                    .headers
                    .push(("Location".to_string(), canonical_location(kind, id)));
                response
            }
            None => error_response(404, "Resource not found"),
        }
    }

    fn replace(&self, kind: Kind, id: &str, body: Option<&str>) -> WireResponse {
        let Some(parsed) = body.and_then(|b| serde_json::from_str::<Value>(b).ok()) else {
            return error_response(400, "Request body is not valid JSON");
        };
        let key = kind.unique_attribute();
        let Some(replacement) = parsed.get(key).and_then(Value::as_str) else {
            return error_response(400, &format!("Required attribute {key} is missing"));
        };

        let mut state = self.state.lock().unwrap();
        let table = kind.table_mut(&mut state);
        let Some(stored) = table.get_mut(id) else {
            return error_response(404, "Resource not found");
        };
        if kind == Kind::User && stored.get(key).and_then(Value::as_str) != Some(replacement) {
            // userName is immutable.
            return error_response(400, "userName cannot be changed");
        }
        let mut updated = parsed;
        if let Some(map) = updated.as_object_mut() {
            map.insert("id".to_string(), json!(id));
            map.insert("schemas".to_string(), json!([kind.schema_urn()]));
            map.insert("meta".to_string(), resource_meta(kind, id));
            map.remove("password");
        }
        *stored = updated.clone();
        drop(state);
        let mut response = ok_json(200, updated.to_string());
        response
            .headers
            .push(("Location".to_string(), canonical_location(kind, id)));
        response
    }

    fn delete(&self, kind: Kind, id: &str) -> WireResponse {
        let mut state = self.state.lock().unwrap();
        if kind.table_mut(&mut state).remove(id).is_some() {
            state.deleted += 1;
            WireResponse {
                status: 204,
                headers: Vec::new(),
                body: String::new(),
            }
        } else {
            error_response(404, "Resource not found")
        }
    }
}

impl WireClient for FakeScimServer {
    async fn execute(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        if self.refuse_connections {
            return Err(TransportError::connection(
                &request.url,
                "connection refused",
            ));
        }
        Ok(self.respond(&request))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    User,
    Group,
}

impl Kind {
    fn endpoint(self) -> &'static str {
        match self {
            Kind::User => "/Users",
            Kind::Group => "/Groups",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Kind::User => "User",
            Kind::Group => "Group",
        }
    }

    fn schema_urn(self) -> &'static str {
        match self {
            Kind::User => "urn:ietf:params:scim:schemas:core:2.0:User",
            Kind::Group => "urn:ietf:params:scim:schemas:core:2.0:Group",
        }
    }

    fn unique_attribute(self) -> &'static str {
        match self {
            Kind::User => "userName",
            Kind::Group => "displayName",
        }
    }

    fn table(self, state: &State) -> &BTreeMap<String, Value> {
        match self {
            Kind::User => &state.users,
            Kind::Group => &state.groups,
        }
    }

    fn table_mut(self, state: &mut State) -> &mut BTreeMap<String, Value> {
        match self {
            Kind::User => &mut state.users,
            Kind::Group => &mut state.groups,
        }
    }
}

fn default_provider_config() -> String {
    json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:ServiceProviderConfig"],
        "patch": {"supported": true},
        "bulk": {"supported": false, "maxOperations": 1000, "maxPayloadSize": 1048576},
        "filter": {"supported": true, "maxResults": 200},
        "changePassword": {"supported": false},
        "sort": {"supported": true},
        "etag": {"supported": false}
    })
    .to_string()
}

pub fn provider_config_without_filtering() -> String {
    json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:ServiceProviderConfig"],
        "patch": {"supported": true},
        "bulk": {"supported": false},
        "filter": {"supported": false},
        "changePassword": {"supported": false},
        "sort": {"supported": true},
        "etag": {"supported": false}
    })
    .to_string()
}

fn canonical_location(kind: Kind, id: &str) -> String {
    format!("{BASE_URL}{}/{id}", kind.endpoint())
}

fn resource_meta(kind: Kind, id: &str) -> Value {
    json!({"resourceType": kind.name(), "location": canonical_location(kind, id)})
}

fn ok_json(status: u16, body: String) -> WireResponse {
    WireResponse {
        status,
        headers: vec![(
            "Content-Type".to_string(),
            "application/scim+json".to_string(),
        )],
        body,
    }
}

fn error_response(status: u16, detail: &str) -> WireResponse {
    ok_json(
        status,
        json!({
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:Error"],
            "status": status.to_string(),
            "detail": detail
        })
        .to_string(),
    )
}

fn list_envelope(total: usize, start_index: i64, page: &[Value]) -> Value {
    json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:ListResponse"],
        "totalResults": total,
        "startIndex": start_index,
        "itemsPerPage": page.len(),
        "Resources": page
    })
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), url_decode(v)))
        .collect()
}

fn url_decode(value: &str) -> String {
    value.replace('+', " ").replace("%22", "\"")
}

/// Filter grammar: `attribute op "value"` or `attribute pr`. Attribute and
/// operator match case-insensitively, like the reference providers do.
fn apply_filter(resources: &mut Vec<Value>, kind: Kind, filter: &str) -> Result<(), String> {
    let mut parts = filter.splitn(3, ' ');
    let attribute = parts.next().unwrap_or_default().to_lowercase();
    let operator = parts.next().unwrap_or_default().to_lowercase();
    let value = parts
        .next()
        .unwrap_or_default()
        .trim_matches('"')
        .to_string();

    if attribute != kind.unique_attribute().to_lowercase() {
        return Err(format!("Unsupported filter attribute {attribute}"));
    }
    let keep = |v: &Value| -> Result<bool, String> {
        let field = v
            .get(kind.unique_attribute())
            .and_then(Value::as_str)
            .unwrap_or_default();
        match operator.as_str() {
            "eq" => Ok(field == value),
            "ne" => Ok(field != value),
            "co" => Ok(field.contains(&value)),
            "sw" => Ok(field.starts_with(&value)),
            "ew" => Ok(field.ends_with(&value)),
            "pr" => Ok(!field.is_empty()),
            other => Err(format!("Unknown filter operator {other}")),
        }
    };
    let mut failure = None;
    resources.retain(|v| match keep(v) {
        Ok(keep) => keep,
        Err(message) => {
            failure = Some(message);
            false
        }
    });
    match failure {
        Some(message) => Err(message),
        None => Ok(()),
    }
}

/// Attribute projection for get-by-id: only `excludedAttributes` handling is
/// modeled, which is what the catalog's exclusion cases observe.
fn apply_projection(body: &mut Value, kind: Kind, query: &str) {
    let params = parse_query(query);
    let Some(excluded) = params.get("excludedAttributes") else {
        return;
    };
    let Some(map) = body.as_object_mut() else {
        return;
    };
    if excluded.contains("employeeNumber") && kind == Kind::User {
        map.remove("urn:ietf:params:scim:schemas:extension:enterprise:2.0:User");
    }
    if excluded.contains("members") && kind == Kind::Group {
        map.remove("members");
    }
}
