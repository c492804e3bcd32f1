use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListStreamsParams {
    /// Project key or name; omit to list every stream
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct SearchDefectsParams {
    /// Free-text query passed through to the server
    #[serde(default)]
    pub query: Option<String>,
    /// Restrict to one stream (by name)
    #[serde(default)]
    pub stream_id: Option<String>,
    /// Checker name, e.g. NULL_RETURNS
    #[serde(default)]
    pub checker: Option<String>,
    /// Impact: High, Medium or Low
    #[serde(default)]
    pub severity: Option<String>,
    /// Triage status, e.g. New, Triaged, Fixed, Dismissed
    #[serde(default)]
    pub status: Option<String>,
    /// Maximum number of defects to return (default 50)
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DefectIdParams {
    /// Coverity defect identifier (CID)
    pub cid: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListUsersParams {
    /// Include disabled accounts (default false)
    #[serde(default)]
    pub include_disabled: Option<bool>,
    /// Include locked accounts (default false)
    #[serde(default)]
    pub include_locked: Option<bool>,
    /// Maximum number of users to return (default 200)
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UsernameParams {
    /// Account name
    pub username: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProjectIdParams {
    /// Project key or name
    pub project_id: String,
}
