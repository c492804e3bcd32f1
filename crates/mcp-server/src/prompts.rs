use rmcp::ErrorData;
use rmcp::model::{GetPromptResult, Prompt, PromptMessage, PromptMessageRole};

const SECURITY_ANALYSIS: &str = "security_analysis";
const USER_AUDIT: &str = "user_audit";

const SECURITY_ANALYSIS_TEXT: &str = "\
Review the security posture of the Coverity Connect projects.

1. Call list_projects, then get_project_summary for each project.
2. For streams with High impact defects, call search_defects with severity=High and status=New.
3. Open the most significant findings with get_defect_details and read the event trace.
4. Report: affected streams, the riskiest checkers (for example SQLI, XSS, PATH_MANIPULATION), \
and a prioritized remediation list.

If a tool returns an error result, say which call failed and why instead of guessing.";

const USER_AUDIT_TEXT: &str = "\
Audit user accounts and permissions on the Coverity Connect server.

1. Call get_user_summary for totals and the role distribution.
2. Call list_users with include_disabled=true and include_locked=true.
3. For each administrator or project owner, call get_user_roles.
4. Report: accounts with global administrator rights, disabled or locked accounts that still \
hold roles, and accounts that have not logged in recently.

If a tool returns an error result, say which call failed and why instead of guessing.";

pub(crate) fn list() -> Vec<Prompt> {
    vec![
        Prompt::new(
            SECURITY_ANALYSIS,
            Some("Walk through projects and high-impact defects to assess security risk"),
            None,
        ),
        Prompt::new(
            USER_AUDIT,
            Some("Review accounts, role assignments and account status"),
            None,
        ),
    ]
}

pub(crate) fn get(name: &str) -> Result<GetPromptResult, ErrorData> {
    let (description, text) = match name {
        SECURITY_ANALYSIS => ("Security analysis of Coverity findings", SECURITY_ANALYSIS_TEXT),
        USER_AUDIT => ("Audit of Coverity Connect users and roles", USER_AUDIT_TEXT),
        other => {
            return Err(ErrorData::invalid_params(
                format!("Unknown prompt: {other}"),
                None,
            ));
        }
    };
    Ok(GetPromptResult {
        description: Some(description.to_string()),
        messages: vec![PromptMessage::new_text(PromptMessageRole::User, text)],
    })
}
