//! Typed records returned by the Coverity Connect REST API.
//!
//! Records deserialize from the remote's camelCase wire names and serialize with snake_case
//! names. Wire fields that are not modelled are kept in `extra` so nothing is dropped when a
//! record is republished.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_DEFECT_LIMIT: u32 = 50;
pub const DEFAULT_USER_LIMIT: u32 = 200;

/// A Coverity project.
///
/// The remote has used both `projectName` and `name` for the display name, and both
/// `createdDate`/`dateCreated` for the creation time; either spelling is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProjectWire")]
pub struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    /// True when `id` equals this project's key or name.
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        self.key.as_deref() == Some(id) || self.name.as_deref() == Some(id)
    }

    /// Key if present, otherwise name.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.key.as_deref().or(self.name.as_deref())
    }
}

#[derive(Deserialize)]
struct ProjectWire {
    #[serde(rename = "projectKey", default, deserialize_with = "opt_string_or_number")]
    project_key: Option<String>,
    #[serde(rename = "projectName")]
    project_name: Option<String>,
    name: Option<String>,
    description: Option<String>,
    #[serde(rename = "createdDate")]
    created_date: Option<String>,
    #[serde(rename = "dateCreated")]
    date_created: Option<String>,
    #[serde(rename = "lastModified")]
    last_modified: Option<String>,
    #[serde(rename = "dateModified")]
    date_modified: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<ProjectWire> for Project {
    fn from(w: ProjectWire) -> Self {
        Self {
            key: w.project_key,
            name: w.project_name.or(w.name),
            description: w.description,
            created_at: w.created_date.or(w.date_created),
            modified_at: w.last_modified.or(w.date_modified),
            extra: w.extra,
        }
    }
}

/// An analysis stream. Identified by name, optionally scoped to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename(deserialize = "projectId"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Severity bucket derived from a defect's impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Severity {
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    /// Buckets tabulated by project summaries. `Unknown` is never counted.
    pub const BUCKETS: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    /// Exact, case-sensitive match on the remote's impact label.
    #[must_use]
    pub fn from_impact(impact: Option<&str>) -> Self {
        match impact {
            Some("High") => Self::High,
            Some("Medium") => Self::Medium,
            Some("Low") => Self::Low,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A merged defect ("issue") as returned by search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defect {
    #[serde(deserialize_with = "string_or_number")]
    pub cid: String,
    #[serde(
        rename(deserialize = "checkerName"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub checker_name: Option<String>,
    #[serde(
        rename(deserialize = "displayType"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_type: Option<String>,
    #[serde(
        rename(deserialize = "displayImpact"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub impact: Option<String>,
    #[serde(
        rename(deserialize = "displayStatus"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(
        rename(deserialize = "displayFile"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub file_path: Option<String>,
    #[serde(
        rename(deserialize = "displayFunction"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub function_name: Option<String>,
    #[serde(
        rename(deserialize = "firstDetected"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub first_detected: Option<String>,
    #[serde(
        rename(deserialize = "streamId"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stream_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Defect {
    #[must_use]
    pub fn severity(&self) -> Severity {
        Severity::from_impact(self.impact.as_deref())
    }
}

/// A defect with its ordered event trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectDetail {
    #[serde(flatten)]
    pub defect: Defect,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<DefectEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectEvent {
    #[serde(
        rename(deserialize = "eventNumber"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub event_number: Option<u64>,
    #[serde(
        rename(deserialize = "eventTag"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tag: Option<String>,
    #[serde(
        rename(deserialize = "eventDescription"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        rename(deserialize = "fileName"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub file: Option<String>,
    #[serde(
        rename(deserialize = "lineNumber"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub line: Option<u64>,
}

/// A Coverity Connect user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename(deserialize = "name"))]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        rename(deserialize = "familyName"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub family_name: Option<String>,
    #[serde(
        rename(deserialize = "givenName"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub given_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locked: bool,
    #[serde(
        rename(deserialize = "superUser"),
        default,
        deserialize_with = "null_as_default"
    )]
    pub is_superuser: bool,
    /// Ordered, duplicates removed.
    #[serde(
        rename(deserialize = "groupNames"),
        default,
        deserialize_with = "dedup_strings"
    )]
    pub group_names: Vec<String>,
    #[serde(
        rename(deserialize = "roleAssignments"),
        default,
        deserialize_with = "null_as_default"
    )]
    pub role_assignments: Vec<RoleAssignment>,
    #[serde(
        rename(deserialize = "lastLogin"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_login: Option<String>,
    #[serde(
        rename(deserialize = "dateCreated"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
    #[serde(
        rename(deserialize = "dateModified"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub modified_at: Option<String>,
    #[serde(rename(deserialize = "local"), default = "default_true")]
    pub is_local: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Grant of one role to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    #[serde(rename(deserialize = "roleName"))]
    pub role_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<RoleScope>,
    #[serde(
        rename(deserialize = "roleAssignmentType"),
        default = "default_assignment_type"
    )]
    pub assignment_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Where a role applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleScope {
    Global,
    Project,
    Other(String),
}

impl From<String> for RoleScope {
    fn from(s: String) -> Self {
        match s.as_str() {
            "global" => Self::Global,
            "project" => Self::Project,
            _ => Self::Other(s),
        }
    }
}

impl From<RoleScope> for String {
    fn from(s: RoleScope) -> Self {
        match s {
            RoleScope::Global => "global".to_string(),
            RoleScope::Project => "project".to_string(),
            RoleScope::Other(s) => s,
        }
    }
}

/// Aggregate user statistics as reported by the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename(deserialize = "totalUsers"), default)]
    pub total_users: u64,
    #[serde(rename(deserialize = "activeUsers"), default)]
    pub active_users: u64,
    #[serde(rename(deserialize = "disabledUsers"), default)]
    pub disabled_users: u64,
    #[serde(rename(deserialize = "adminUsers"), default)]
    pub admin_users: u64,
    #[serde(rename(deserialize = "roleDistribution"), default)]
    pub role_distribution: BTreeMap<String, u64>,
}

/// Parameters for a defect search.
///
/// `filters` is an open map merged verbatim into the outbound query string after the fixed
/// parameters; nothing is filtered locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefectQuery {
    pub stream_id: Option<String>,
    pub query: Option<String>,
    pub filters: BTreeMap<String, String>,
    pub limit: u32,
}

impl Default for DefectQuery {
    fn default() -> Self {
        Self {
            stream_id: None,
            query: None,
            filters: BTreeMap::new(),
            limit: DEFAULT_DEFECT_LIMIT,
        }
    }
}

impl DefectQuery {
    #[must_use]
    pub fn for_stream(stream_id: impl Into<String>, limit: u32) -> Self {
        Self {
            stream_id: Some(stream_id.into()),
            limit,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }
}

/// Parameters for listing users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserQuery {
    pub include_disabled: bool,
    pub include_locked: bool,
    pub limit: u32,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            include_disabled: false,
            include_locked: false,
            limit: DEFAULT_USER_LIMIT,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_assignment_type() -> String {
    "user".to_string()
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn dedup_strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let raw: Vec<String> = null_as_default(d)?;
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for s in raw {
        if !out.contains(&s) {
            out.push(s);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_accepts_either_name_spelling() {
        let p: Project = serde_json::from_value(json!({
            "projectKey": "PROJ001",
            "name": "WebApplication",
            "dateCreated": "2024-01-15T10:30:00Z",
            "userCreated": "developer1"
        }))
        .expect("project");
        assert_eq!(p.key.as_deref(), Some("PROJ001"));
        assert_eq!(p.name.as_deref(), Some("WebApplication"));
        assert_eq!(p.created_at.as_deref(), Some("2024-01-15T10:30:00Z"));
        assert_eq!(p.extra.get("userCreated"), Some(&json!("developer1")));
        assert!(p.matches("PROJ001"));
        assert!(p.matches("WebApplication"));
        assert!(!p.matches("proj001"));

        let p: Project = serde_json::from_value(json!({
            "projectKey": 10001,
            "projectName": "Alpha",
            "name": "alpha-legacy"
        }))
        .expect("project");
        assert_eq!(p.key.as_deref(), Some("10001"));
        assert_eq!(p.name.as_deref(), Some("Alpha"));
    }

    #[test]
    fn defect_cid_may_be_numeric() {
        let d: Defect = serde_json::from_value(json!({
            "cid": 1001,
            "checkerName": "NULL_RETURNS",
            "displayImpact": "high",
            "displayStatus": "New"
        }))
        .expect("defect");
        assert_eq!(d.cid, "1001");
        assert_eq!(d.severity(), Severity::High);

        let v = serde_json::to_value(&d).expect("serialize");
        assert_eq!(v["checker_name"], json!("NULL_RETURNS"));
        assert_eq!(v["status"], json!("New"));
    }

    #[test]
    fn severity_buckets_only_cover_known_impacts() {
        assert_eq!(Severity::from_impact(Some("Medium")), Severity::Medium);
        assert_eq!(Severity::from_impact(Some("Audit")), Severity::Unknown);
        assert_eq!(Severity::from_impact(Some("high")), Severity::Unknown);
        assert_eq!(Severity::from_impact(Some(" Low ")), Severity::Unknown);
        assert_eq!(Severity::from_impact(None), Severity::Unknown);
        assert!(!Severity::BUCKETS.contains(&Severity::Unknown));
    }

    #[test]
    fn defect_detail_keeps_event_order() {
        let d: DefectDetail = serde_json::from_value(json!({
            "cid": "1002",
            "events": [
                {"eventNumber": 1, "eventTag": "alloc", "fileName": "a.c", "lineNumber": 10},
                {"eventNumber": 2, "eventTag": "leak", "fileName": "a.c", "lineNumber": 42}
            ]
        }))
        .expect("detail");
        assert_eq!(d.defect.cid, "1002");
        let tags: Vec<_> = d.events.iter().filter_map(|e| e.tag.as_deref()).collect();
        assert_eq!(tags, vec!["alloc", "leak"]);
        assert!(!d.defect.extra.contains_key("events"));
    }

    #[test]
    fn user_defaults_and_group_dedup() {
        let u: User = serde_json::from_value(json!({
            "name": "bob",
            "groupNames": ["Users", "Admins", "Users"],
            "roleAssignments": [
                {"roleName": "developer", "scope": "project"},
                {"roleName": "custom", "scope": "stream", "roleAssignmentType": "group"}
            ]
        }))
        .expect("user");
        assert_eq!(u.group_names, vec!["Users", "Admins"]);
        assert!(u.is_local);
        assert!(!u.disabled);
        assert_eq!(u.role_assignments[0].assignment_type, "user");
        assert_eq!(u.role_assignments[0].scope, Some(RoleScope::Project));
        assert_eq!(
            u.role_assignments[1].scope,
            Some(RoleScope::Other("stream".to_string()))
        );
        assert_eq!(u.role_assignments[1].assignment_type, "group");
    }
}
