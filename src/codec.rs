//! SCIM JSON codec.
//!
//! Decodes wire bodies into typed `User`/`Group` resources and SCIM list
//! responses. The runner only checks what the codec hands back; it never
//! interprets raw JSON beyond the projection spot-checks that need access to
//! the undecoded tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;

/// The enterprise user extension schema URN.
pub const ENTERPRISE_USER_URN: &str =
    "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";

/// The two SCIM resource types this harness exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    User,
    Group,
}

impl ResourceKind {
    /// Endpoint path under the base URL, e.g. `/Users`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ResourceKind::User => "/Users",
            ResourceKind::Group => "/Groups",
        }
    }

    /// Core schema URN for the resource type.
    pub fn schema_urn(&self) -> &'static str {
        match self {
            ResourceKind::User => "urn:ietf:params:scim:schemas:core:2.0:User",
            ResourceKind::Group => "urn:ietf:params:scim:schemas:core:2.0:Group",
        }
    }

    /// Name of the unique attribute that filter cases match on.
    pub fn filter_attribute(&self) -> &'static str {
        match self {
            ResourceKind::User => "userName",
            ResourceKind::Group => "displayName",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::User => "User",
            ResourceKind::Group => "Group",
        }
    }

    /// Lowercase plural for log and error messages ("users"/"groups").
    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::User => "users",
            ResourceKind::Group => "groups",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Common `meta` complex attribute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Meta {
    pub resource_type: Option<String>,
    pub created: Option<String>,
    pub last_modified: Option<String>,
    pub location: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Name {
    pub formatted: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Email {
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub email_type: Option<String>,
    pub primary: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub value: Option<String>,
    pub display: Option<String>,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Manager {
    pub value: Option<String>,
    pub display_name: Option<String>,
}

/// Enterprise user extension attributes exercised by the fixtures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnterpriseUser {
    pub employee_number: Option<String>,
    pub manager: Option<Manager>,
}

/// A SCIM user as returned by the target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub schemas: Vec<String>,
    pub id: Option<String>,
    pub external_id: Option<String>,
    pub user_name: Option<String>,
    pub name: Option<Name>,
    pub nick_name: Option<String>,
    pub emails: Vec<Email>,
    pub password: Option<String>,
    pub meta: Option<Meta>,
    #[serde(rename = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User")]
    pub enterprise: Option<EnterpriseUser>,
}

/// A SCIM group as returned by the target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
    pub schemas: Vec<String>,
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub members: Vec<Member>,
    pub meta: Option<Meta>,
}

/// A decoded resource of either kind.
#[derive(Debug, Clone)]
pub enum Resource {
    User(User),
    Group(Group),
}

impl Resource {
    /// Decode `body` against the named resource type.
    pub fn decode(kind: ResourceKind, body: &str) -> Result<Self, DecodeError> {
        if body.trim().is_empty() {
            return Err(DecodeError::EmptyBody {
                resource_type: kind.name().to_string(),
            });
        }
        match kind {
            ResourceKind::User => Ok(Resource::User(serde_json::from_str(body)?)),
            ResourceKind::Group => Ok(Resource::Group(serde_json::from_str(body)?)),
        }
    }

    /// Decode an element of a list response's `Resources` array.
    pub fn from_value(kind: ResourceKind, value: Value) -> Result<Self, DecodeError> {
        match kind {
            ResourceKind::User => Ok(Resource::User(serde_json::from_value(value)?)),
            ResourceKind::Group => Ok(Resource::Group(serde_json::from_value(value)?)),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::User(_) => ResourceKind::User,
            Resource::Group(_) => ResourceKind::Group,
        }
    }

    /// Server-assigned id, if present.
    pub fn id(&self) -> Option<&str> {
        match self {
            Resource::User(u) => u.id.as_deref(),
            Resource::Group(g) => g.id.as_deref(),
        }
    }

    /// Id as required for fixture bookkeeping.
    pub fn require_id(&self) -> Result<&str, DecodeError> {
        self.id()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DecodeError::missing_field(self.kind().name(), "id"))
    }

    pub fn meta(&self) -> Option<&Meta> {
        match self {
            Resource::User(u) => u.meta.as_ref(),
            Resource::Group(g) => g.meta.as_ref(),
        }
    }

    pub fn schemas(&self) -> &[String] {
        match self {
            Resource::User(u) => &u.schemas,
            Resource::Group(g) => &g.schemas,
        }
    }

    /// Value of the kind's unique filter attribute (`userName`/`displayName`).
    pub fn filter_value(&self) -> Option<&str> {
        match self {
            Resource::User(u) => u.user_name.as_deref(),
            Resource::Group(g) => g.display_name.as_deref(),
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Resource::User(u) => Some(u),
            Resource::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Resource::Group(g) => Some(g),
            Resource::User(_) => None,
        }
    }
}

/// SCIM list response envelope (`urn:ietf:params:scim:api:messages:2.0:ListResponse`).
///
/// Elements stay as raw values; callers decode them per resource type so a
/// single malformed element is attributable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListResponse {
    pub schemas: Vec<String>,
    pub total_results: Option<i64>,
    pub start_index: Option<i64>,
    pub items_per_page: Option<i64>,
    #[serde(rename = "Resources")]
    pub resources: Vec<Value>,
}

impl ListResponse {
    pub fn decode(body: &str) -> Result<Self, DecodeError> {
        if body.trim().is_empty() {
            return Err(DecodeError::EmptyBody {
                resource_type: "ListResponse".to_string(),
            });
        }
        Ok(serde_json::from_str(body)?)
    }

    /// Decode every `Resources` element against the given type.
    pub fn decode_resources(&self, kind: ResourceKind) -> Result<Vec<Resource>, DecodeError> {
        self.resources
            .iter()
            .map(|v| Resource::from_value(kind, v.clone()))
            .collect()
    }
}
