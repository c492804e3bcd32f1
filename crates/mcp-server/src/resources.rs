//! Parameterized `coverity://` resources.

use coverity_connect_client::{CoverityApi, CoverityError, Defect, DefectQuery};
use rmcp::ErrorData;
use rmcp::model::{
    AnnotateAble, Annotated, RawResourceTemplate, ReadResourceResult, ResourceContents,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::borrow::Cow;

const JSON_MIME: &str = "application/json";
const PREVIEW_LEN: usize = 10;
const RESOURCE_DEFECT_LIMIT: u32 = 100;

const PROJECT_PREFIX: &str = "coverity://projects/";
const STREAM_PREFIX: &str = "coverity://streams/";

fn no_ann<T: AnnotateAble>(raw: T) -> Annotated<T> {
    Annotated::new(raw, None)
}

fn template(uri_template: &str, name: &str, title: &str, description: &str) -> Annotated<RawResourceTemplate> {
    no_ann(RawResourceTemplate {
        uri_template: uri_template.into(),
        name: name.into(),
        title: Some(title.into()),
        description: Some(description.into()),
        mime_type: Some(JSON_MIME.into()),
        icons: None,
    })
}

pub(crate) fn templates() -> Vec<Annotated<RawResourceTemplate>> {
    vec![
        template(
            "coverity://projects/{project_id}/config",
            "project-config",
            "Project configuration",
            "Project fields with its first streams",
        ),
        template(
            "coverity://streams/{stream_id}/defects",
            "stream-defects",
            "Stream defects",
            "First defects of a stream in compact form",
        ),
        template(
            "coverity://streams/{stream_id}/status",
            "stream-status",
            "Stream status",
            "Stream record with its defect count and most recent defects",
        ),
    ]
}

#[derive(Debug, PartialEq)]
enum Target<'a> {
    ProjectConfig(Cow<'a, str>),
    StreamDefects(Cow<'a, str>),
    StreamStatus(Cow<'a, str>),
}

/// Percent-decoded, non-empty id segment. Ids containing `/` must arrive encoded.
fn id_segment(raw: &str) -> Option<Cow<'_, str>> {
    if raw.is_empty() || raw.contains('/') {
        return None;
    }
    urlencoding::decode(raw).ok()
}

fn parse(uri: &str) -> Option<Target<'_>> {
    if let Some(rest) = uri.strip_prefix(PROJECT_PREFIX) {
        return id_segment(rest.strip_suffix("/config")?).map(Target::ProjectConfig);
    }
    let rest = uri.strip_prefix(STREAM_PREFIX)?;
    if let Some(id) = rest.strip_suffix("/defects") {
        return id_segment(id).map(Target::StreamDefects);
    }
    id_segment(rest.strip_suffix("/status")?).map(Target::StreamStatus)
}

pub(crate) async fn read(api: &dyn CoverityApi, uri: &str) -> Result<ReadResourceResult, ErrorData> {
    let body = match parse(uri) {
        Some(Target::ProjectConfig(id)) => project_config(api, &id).await,
        Some(Target::StreamDefects(id)) => stream_defects(api, &id).await,
        Some(Target::StreamStatus(id)) => stream_status(api, &id).await,
        None => {
            return Err(ErrorData::invalid_params(
                format!("Unknown resource URI: {uri}"),
                None,
            ));
        }
    }
    .map_err(|e| remote_error(uri, &e))?;

    let Some(body) = body else {
        return Err(ErrorData::resource_not_found(
            format!("Resource not found: {uri}"),
            None,
        ));
    };

    let text = serde_json::to_string_pretty(&body)
        .map_err(|e| ErrorData::internal_error(format!("serialize {uri}: {e}"), None))?;
    Ok(ReadResourceResult {
        contents: vec![ResourceContents::TextResourceContents {
            uri: uri.to_string(),
            mime_type: Some(JSON_MIME.into()),
            text,
            meta: None,
        }],
    })
}

fn remote_error(uri: &str, e: &CoverityError) -> ErrorData {
    tracing::warn!(uri, kind = e.kind(), error = %e, "resource read failed");
    ErrorData::internal_error(
        e.to_string(),
        Some(crate::outcome::failure_body(e)),
    )
}

#[derive(Serialize)]
struct CompactDefect<'a> {
    cid: &'a str,
    checker: Option<&'a str>,
    #[serde(rename = "type")]
    kind: Option<&'a str>,
    severity: Option<&'a str>,
    status: Option<&'a str>,
    file: Option<&'a str>,
    function: Option<&'a str>,
}

impl<'a> From<&'a Defect> for CompactDefect<'a> {
    fn from(d: &'a Defect) -> Self {
        Self {
            cid: &d.cid,
            checker: d.checker_name.as_deref(),
            kind: d.display_type.as_deref(),
            severity: d.impact.as_deref(),
            status: d.status.as_deref(),
            file: d.file_path.as_deref(),
            function: d.function_name.as_deref(),
        }
    }
}

fn preview(defects: &[Defect]) -> Vec<CompactDefect<'_>> {
    defects.iter().take(PREVIEW_LEN).map(CompactDefect::from).collect()
}

async fn project_config(
    api: &dyn CoverityApi,
    project_id: &str,
) -> coverity_connect_client::Result<Option<Value>> {
    let Some(project) = api.get_project(project_id).await? else {
        return Ok(None);
    };
    let streams = api
        .list_streams(Some(project.identity().unwrap_or(project_id)))
        .await?;
    Ok(Some(json!({
        "project": project,
        "streams": streams.iter().take(PREVIEW_LEN).collect::<Vec<_>>(),
        "stream_count": streams.len(),
    })))
}

async fn stream_defects(
    api: &dyn CoverityApi,
    stream_id: &str,
) -> coverity_connect_client::Result<Option<Value>> {
    let defects = api
        .search_defects(&DefectQuery::for_stream(stream_id, RESOURCE_DEFECT_LIMIT))
        .await?;
    Ok(Some(json!({
        "stream_id": stream_id,
        "defects": preview(&defects),
        "total_fetched": defects.len(),
    })))
}

async fn stream_status(
    api: &dyn CoverityApi,
    stream_id: &str,
) -> coverity_connect_client::Result<Option<Value>> {
    let Some(stream) = api
        .list_streams(None)
        .await?
        .into_iter()
        .find(|s| s.name == stream_id)
    else {
        return Ok(None);
    };
    let defects = api
        .search_defects(&DefectQuery::for_stream(stream_id, RESOURCE_DEFECT_LIMIT))
        .await?;
    Ok(Some(json!({
        "stream": stream,
        "defect_count": defects.len(),
        "recent_defects": preview(&defects),
    })))
}
