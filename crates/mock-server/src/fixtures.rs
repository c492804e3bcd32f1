//! Canned data served by the mock. Shapes follow the remote's wire names.

use serde_json::{Value, json};

pub fn projects() -> Vec<Value> {
    vec![
        json!({
            "projectKey": "PROJ001",
            "name": "WebApplication",
            "description": "Customer-facing web application",
            "dateCreated": "2024-01-15T10:30:00Z",
            "userCreated": "developer1"
        }),
        json!({
            "projectKey": "PROJ002",
            "name": "MobileApp",
            "description": "iOS and Android clients",
            "dateCreated": "2024-02-20T14:45:00Z",
            "userCreated": "developer2"
        }),
        json!({
            "projectKey": "PROJ003",
            "name": "APIService",
            "description": "Public REST API",
            "dateCreated": "2024-03-10T09:15:00Z",
            "userCreated": "developer3"
        }),
    ]
}

pub fn streams() -> Vec<Value> {
    let stream = |name: &str, description: &str, project: &str, language: &str| {
        json!({
            "name": name,
            "description": description,
            "projectId": project,
            "language": language
        })
    };
    vec![
        stream("WebApplication-main", "Main development branch", "PROJ001", "JAVA"),
        stream("WebApplication-develop", "Development branch", "PROJ001", "JAVA"),
        stream("WebApplication-release", "Release preparation", "PROJ001", "JAVA"),
        stream("MobileApp-main", "Main branch", "PROJ002", "KOTLIN"),
        stream("MobileApp-feature", "Feature development", "PROJ002", "KOTLIN"),
        stream("APIService-main", "Production branch", "PROJ003", "GO"),
    ]
}

pub fn snapshots() -> Vec<Value> {
    vec![
        json!({"id": "12345", "dateCreated": "2024-07-15T10:00:00Z", "user": "jenkins"}),
        json!({"id": "12346", "dateCreated": "2024-07-14T15:30:00Z", "user": "developer1"}),
        json!({"id": "12347", "dateCreated": "2024-07-13T11:20:00Z", "user": "developer2"}),
    ]
}

struct DefectRow {
    cid: u64,
    stream: &'static str,
    checker: &'static str,
    kind: &'static str,
    impact: &'static str,
    status: Option<&'static str>,
    file: &'static str,
    function: &'static str,
    detected: &'static str,
}

const DEFECTS: &[DefectRow] = &[
    DefectRow {
        cid: 1001,
        stream: "WebApplication-main",
        checker: "NULL_RETURNS",
        kind: "Dereference null return value",
        impact: "High",
        status: Some("New"),
        file: "/src/main/java/com/example/web/UserController.java",
        function: "UserController.show",
        detected: "2024-07-01T09:00:00Z",
    },
    DefectRow {
        cid: 1002,
        stream: "WebApplication-main",
        checker: "RESOURCE_LEAK",
        kind: "Resource leak",
        impact: "Medium",
        status: Some("Triaged"),
        file: "/src/main/java/com/example/web/ReportExporter.java",
        function: "ReportExporter.export",
        detected: "2024-07-02T11:15:00Z",
    },
    DefectRow {
        cid: 1003,
        stream: "WebApplication-main",
        checker: "SQLI",
        kind: "SQL injection",
        impact: "High",
        status: Some("New"),
        file: "/src/main/java/com/example/web/SearchDao.java",
        function: "SearchDao.find",
        detected: "2024-07-03T08:40:00Z",
    },
    DefectRow {
        cid: 1004,
        stream: "WebApplication-main",
        checker: "UNINIT",
        kind: "Uninitialized scalar variable",
        impact: "Low",
        status: Some("Fixed"),
        file: "/src/main/java/com/example/web/Pager.java",
        function: "Pager.next",
        detected: "2024-06-20T16:05:00Z",
    },
    DefectRow {
        cid: 1005,
        stream: "WebApplication-main",
        checker: "DEADCODE",
        kind: "Logically dead code",
        impact: "Audit",
        status: Some("Dismissed"),
        file: "/src/main/java/com/example/web/LegacyFilter.java",
        function: "LegacyFilter.apply",
        detected: "2024-05-11T10:00:00Z",
    },
    DefectRow {
        cid: 1006,
        stream: "WebApplication-develop",
        checker: "FORWARD_NULL",
        kind: "Explicit null dereferenced",
        impact: "Medium",
        status: Some("New"),
        file: "/src/main/java/com/example/web/SessionStore.java",
        function: "SessionStore.lookup",
        detected: "2024-07-10T13:30:00Z",
    },
    DefectRow {
        cid: 1007,
        stream: "WebApplication-develop",
        checker: "CHECKED_RETURN",
        kind: "Unchecked return value",
        impact: "Low",
        status: None,
        file: "/src/main/java/com/example/web/FileCache.java",
        function: "FileCache.evict",
        detected: "2024-07-11T07:45:00Z",
    },
    DefectRow {
        cid: 1008,
        stream: "MobileApp-main",
        checker: "XSS",
        kind: "Cross-site scripting",
        impact: "High",
        status: Some("New"),
        file: "/app/src/main/kotlin/com/example/mobile/WebViewBridge.kt",
        function: "WebViewBridge.render",
        detected: "2024-07-05T12:00:00Z",
    },
    DefectRow {
        cid: 1009,
        stream: "APIService-main",
        checker: "PATH_MANIPULATION",
        kind: "Filesystem path manipulation",
        impact: "High",
        status: Some("Triaged"),
        file: "/internal/files/handler.go",
        function: "files.Download",
        detected: "2024-07-08T15:20:00Z",
    },
    DefectRow {
        cid: 1010,
        stream: "APIService-main",
        checker: "OVERRUN",
        kind: "Out-of-bounds access",
        impact: "Medium",
        status: Some("New"),
        file: "/internal/codec/frame.go",
        function: "codec.ReadFrame",
        detected: "2024-07-09T10:10:00Z",
    },
];

fn defect_json(row: &DefectRow) -> Value {
    let mut v = json!({
        "cid": row.cid,
        "checkerName": row.checker,
        "displayType": row.kind,
        "displayImpact": row.impact,
        "displayFile": row.file,
        "displayFunction": row.function,
        "firstDetected": row.detected,
        "streamId": row.stream,
        "occurrenceCount": 1
    });
    if let (Some(status), Some(obj)) = (row.status, v.as_object_mut()) {
        obj.insert("displayStatus".to_string(), json!(status));
    }
    v
}

pub fn defects() -> Vec<Value> {
    DEFECTS.iter().map(defect_json).collect()
}

/// Defect with a short event trace, or `None` for an unknown CID.
pub fn defect_detail(cid: &str) -> Option<Value> {
    let row = DEFECTS.iter().find(|d| d.cid.to_string() == cid)?;
    let mut v = defect_json(row);
    let line = 40 + row.cid % 100;
    let events = json!([
        {
            "eventNumber": 1,
            "eventTag": "path",
            "eventDescription": format!("Entering {}", row.function),
            "fileName": row.file,
            "lineNumber": line - 10
        },
        {
            "eventNumber": 2,
            "eventTag": row.checker.to_ascii_lowercase(),
            "eventDescription": row.kind,
            "fileName": row.file,
            "lineNumber": line
        }
    ]);
    if let Some(obj) = v.as_object_mut() {
        obj.insert("events".to_string(), events);
    }
    Some(v)
}

pub fn users() -> Vec<Value> {
    vec![
        user(
            "admin",
            "admin@company.com",
            ("Administrator", "System"),
            &["Administrators", "Users"],
            ("administrator", "global"),
            UserFlags {
                disabled: false,
                super_user: true,
            },
            ("2024-07-21T10:00:00Z", "2024-01-01T00:00:00Z", "2024-07-21T10:00:00Z"),
            "ja_JP",
        ),
        user(
            "developer1",
            "dev1@company.com",
            ("開発", "太郎"),
            &["Users"],
            ("developer", "global"),
            UserFlags::default(),
            ("2024-07-20T15:30:00Z", "2024-02-01T00:00:00Z", "2024-07-20T15:30:00Z"),
            "ja_JP",
        ),
        user(
            "projectowner1",
            "owner1@company.com",
            ("プロジェクト", "花子"),
            &["Users"],
            ("projectOwner", "project"),
            UserFlags::default(),
            ("2024-07-19T09:15:00Z", "2024-03-01T00:00:00Z", "2024-07-19T09:15:00Z"),
            "ja_JP",
        ),
        user(
            "analyst1",
            "analyst1@company.com",
            ("分析", "次郎"),
            &["Users"],
            ("analyst", "global"),
            UserFlags::default(),
            ("2024-07-18T13:45:00Z", "2024-04-01T00:00:00Z", "2024-07-18T13:45:00Z"),
            "en_US",
        ),
        user(
            "disabled_user",
            "disabled@company.com",
            ("無効", "ユーザー"),
            &["Users"],
            ("viewer", "global"),
            UserFlags {
                disabled: true,
                super_user: false,
            },
            ("2024-05-01T10:00:00Z", "2024-05-01T00:00:00Z", "2024-06-01T00:00:00Z"),
            "ja_JP",
        ),
    ]
}

#[derive(Default)]
struct UserFlags {
    disabled: bool,
    super_user: bool,
}

#[allow(clippy::too_many_arguments)]
fn user(
    name: &str,
    email: &str,
    (family, given): (&str, &str),
    groups: &[&str],
    (role, scope): (&str, &str),
    flags: UserFlags,
    (last_login, created, modified): (&str, &str, &str),
    locale: &str,
) -> Value {
    json!({
        "name": name,
        "email": email,
        "familyName": family,
        "givenName": given,
        "disabled": flags.disabled,
        "locked": false,
        "superUser": flags.super_user,
        "groupNames": groups,
        "roleAssignments": [{
            "roleName": role,
            "scope": scope,
            "username": name,
            "roleAssignmentType": "user"
        }],
        "lastLogin": last_login,
        "dateCreated": created,
        "dateModified": modified,
        "local": true,
        "locale": locale
    })
}
