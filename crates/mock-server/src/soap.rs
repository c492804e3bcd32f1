//! Canned SOAP envelopes for the legacy `/ws/v9` services.

use crate::fixtures;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::fmt::Write as _;

const XML_MIME: &str = "text/xml; charset=utf-8";

fn envelope(content: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
    <soap:Body>
        {content}
    </soap:Body>
</soap:Envelope>"#
    )
}

fn xml_response(content: &str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, XML_MIME)],
        envelope(content),
    )
        .into_response()
}

fn field<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(Value::as_str).unwrap_or_default()
}

pub(crate) fn configuration_service(headers: &HeaderMap, body: &str) -> Response {
    let action = headers
        .get("SOAPAction")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .trim_matches('"');

    if action.contains("getProjects") || body.contains("getProjects") {
        let mut items = String::new();
        for p in fixtures::projects() {
            let _ = write!(
                items,
                r"
                <ns1:projectDataObj>
                    <ns1:projectKey>{}</ns1:projectKey>
                    <ns1:id>
                        <ns1:name>{}</ns1:name>
                    </ns1:id>
                    <ns1:dateCreated>{}</ns1:dateCreated>
                    <ns1:userCreated>{}</ns1:userCreated>
                </ns1:projectDataObj>",
                field(&p, "projectKey"),
                field(&p, "name"),
                field(&p, "dateCreated"),
                field(&p, "userCreated"),
            );
        }
        return xml_response(&format!(
            r#"<ns1:getProjectsResponse xmlns:ns1="http://ws.coverity.com/v9">{items}
            </ns1:getProjectsResponse>"#
        ));
    }

    if action.contains("getSnapshotsForStream") || body.contains("getSnapshotsForStream") {
        let mut items = String::new();
        for s in fixtures::snapshots() {
            let _ = write!(
                items,
                r"
                <ns1:snapshotDataObj>
                    <ns1:id>{}</ns1:id>
                    <ns1:dateCreated>{}</ns1:dateCreated>
                    <ns1:user>{}</ns1:user>
                </ns1:snapshotDataObj>",
                field(&s, "id"),
                field(&s, "dateCreated"),
                field(&s, "user"),
            );
        }
        return xml_response(&format!(
            r#"<ns1:getSnapshotsForStreamResponse xmlns:ns1="http://ws.coverity.com/v9">{items}
            </ns1:getSnapshotsForStreamResponse>"#
        ));
    }

    xml_response(
        r#"<ns1:genericResponse xmlns:ns1="http://ws.coverity.com/v9">
                <ns1:status>SUCCESS</ns1:status>
                <ns1:message>Mock response</ns1:message>
            </ns1:genericResponse>"#,
    )
}

pub(crate) fn defect_service() -> Response {
    let cids = ["1001", "1002", "1003"];
    let mut items = String::new();
    for cid in cids {
        let _ = write!(
            items,
            r"
        <ns1:mergedDefectIds>
            <ns1:cid>{cid}</ns1:cid>
        </ns1:mergedDefectIds>"
        );
    }
    xml_response(&format!(
        r#"<ns1:getMergedDefectsForSnapshotScopeResponse xmlns:ns1="http://ws.coverity.com/v9">
        <ns1:totalNumberOfRecords>{}</ns1:totalNumberOfRecords>{items}
    </ns1:getMergedDefectsForSnapshotScopeResponse>"#,
        cids.len()
    ))
}
