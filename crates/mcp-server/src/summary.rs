//! Per-project defect roll-up.

use coverity_connect_client::{CoverityApi, Defect, DefectQuery, Project, Result, Severity};
use futures::stream::{self, StreamExt as _, TryStreamExt as _};
use serde::Serialize;
use std::collections::BTreeMap;

/// Defects fetched per stream when building a summary.
pub const SUMMARY_DEFECT_LIMIT: u32 = 1000;

/// Per-stream searches in flight at once while building a summary.
pub const SUMMARY_CONCURRENCY: usize = 4;

const UNKNOWN_STATUS: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityBreakdown {
    #[serde(rename = "High")]
    pub high: usize,
    #[serde(rename = "Medium")]
    pub medium: usize,
    #[serde(rename = "Low")]
    pub low: usize,
}

impl SeverityBreakdown {
    #[must_use]
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamSummary {
    pub stream_name: String,
    pub total_defects: usize,
    pub severity_breakdown: SeverityBreakdown,
    pub status_breakdown: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub project: Project,
    pub streams: Vec<StreamSummary>,
    pub total_streams: usize,
    pub total_defects: usize,
}

/// Tabulate one stream. Impacts outside High/Medium/Low are left out of the severity table;
/// a missing status is counted as `"Unknown"`.
#[must_use]
pub fn summarize_stream(stream_name: &str, defects: &[Defect]) -> StreamSummary {
    let mut severity = SeverityBreakdown::default();
    let mut status: BTreeMap<String, usize> = BTreeMap::new();

    for d in defects {
        match d.severity() {
            Severity::High => severity.high += 1,
            Severity::Medium => severity.medium += 1,
            Severity::Low => severity.low += 1,
            Severity::Unknown => {}
        }
        let key = d.status.as_deref().unwrap_or(UNKNOWN_STATUS);
        *status.entry(key.to_string()).or_default() += 1;
    }

    StreamSummary {
        stream_name: stream_name.to_string(),
        total_defects: defects.len(),
        severity_breakdown: severity,
        status_breakdown: status,
    }
}

/// Build the summary for `project_id`, or `None` if no project has that key or name.
///
/// Costs one `list_projects`, one `list_streams` and one defect search per stream; the
/// per-stream searches run concurrently, at most [`SUMMARY_CONCURRENCY`] at a time.
///
/// # Errors
///
/// Propagates the first remote failure.
pub async fn project_summary(
    api: &dyn CoverityApi,
    project_id: &str,
) -> Result<Option<ProjectSummary>> {
    let Some(project) = api.get_project(project_id).await? else {
        return Ok(None);
    };

    let scope = project.identity().unwrap_or(project_id);
    let streams = api.list_streams(Some(scope)).await?;

    let names: Vec<String> = streams.into_iter().map(|s| s.name).collect();
    let per_stream: Vec<StreamSummary> = stream::iter(names)
        .map(|name| async move {
            let defects = api
                .search_defects(&DefectQuery::for_stream(&name, SUMMARY_DEFECT_LIMIT))
                .await?;
            Ok::<_, coverity_connect_client::CoverityError>(summarize_stream(&name, &defects))
        })
        .buffered(SUMMARY_CONCURRENCY)
        .try_collect()
        .await?;

    let total_defects = per_stream.iter().map(|s| s.total_defects).sum();
    Ok(Some(ProjectSummary {
        project,
        total_streams: per_stream.len(),
        streams: per_stream,
        total_defects,
    }))
}
