//! CloudEvents HTTP envelope parsing.
//!
//! Both content modes of the HTTP protocol binding are accepted:
//!   - binary mode, where attributes travel as `ce-*` headers and the body is the data,
//!   - structured mode, where the body is a JSON-encoded event (`application/cloudevents+json`).
//!
//! Batched mode is rejected, as each request must map to exactly one stored object.

use std::str::FromStr;

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;

use crate::api::IngestError;

const STRUCTURED_MEDIA_TYPE: &str = "application/cloudevents+json";
const BATCH_MEDIA_TYPE: &str = "application/cloudevents-batch+json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecVersion {
    V03,
    V10,
}

impl FromStr for SpecVersion {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.0" => Ok(SpecVersion::V10),
            "0.3" => Ok(SpecVersion::V03),
            other => Err(IngestError::MalformedEnvelope(format!(
                "unsupported specversion {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub spec_version: SpecVersion,
    pub id: String,
    pub source: String,
    pub event_type: String,
    pub subject: Option<String>,
    pub data_content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Deserialize)]
struct StructuredEvent {
    specversion: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    source: String,
    #[serde(rename = "type", default)]
    event_type: String,
    subject: Option<String>,
    datacontenttype: Option<String>,
    data: Option<Value>,
    data_base64: Option<String>,
}

impl Envelope {
    pub fn from_http(headers: &HeaderMap, body: Bytes) -> Result<Envelope, IngestError> {
        let content_type = header_value(headers, CONTENT_TYPE.as_str());

        let envelope = match content_type.map(media_type).as_deref() {
            Some(BATCH_MEDIA_TYPE) => {
                return Err(IngestError::MalformedEnvelope(String::from(
                    "batched mode is not supported",
                )))
            }
            Some(STRUCTURED_MEDIA_TYPE) => Self::from_structured(&body)?,
            _ if header_value(headers, "ce-specversion").is_some() => {
                Self::from_binary(headers, body)?
            }
            _ => {
                return Err(IngestError::MalformedEnvelope(String::from(
                    "missing specversion",
                )))
            }
        };

        envelope.validate()?;
        Ok(envelope)
    }

    fn from_binary(headers: &HeaderMap, body: Bytes) -> Result<Envelope, IngestError> {
        let attribute = |name: &str| header_value(headers, name).map(String::from);

        Ok(Envelope {
            spec_version: attribute("ce-specversion").unwrap_or_default().parse()?,
            id: attribute("ce-id").unwrap_or_default(),
            source: attribute("ce-source").unwrap_or_default(),
            event_type: attribute("ce-type").unwrap_or_default(),
            subject: attribute("ce-subject"),
            data_content_type: attribute(CONTENT_TYPE.as_str()),
            data: body,
        })
    }

    fn from_structured(body: &[u8]) -> Result<Envelope, IngestError> {
        let event: StructuredEvent = serde_json::from_slice(body)
            .map_err(|e| IngestError::MalformedEnvelope(e.to_string()))?;

        let json_data = event
            .datacontenttype
            .as_deref()
            .map_or(true, is_json_media_type);

        let data = match (event.data_base64, event.data) {
            (Some(_), Some(_)) => {
                return Err(IngestError::MalformedEnvelope(String::from(
                    "both data and data_base64 are set",
                )))
            }
            (Some(encoded), None) => base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map(Bytes::from)
                .map_err(|e| IngestError::MalformedEnvelope(format!("invalid data_base64: {e}")))?,
            (None, None) | (None, Some(Value::Null)) => Bytes::new(),
            (None, Some(Value::String(text))) if !json_data => Bytes::from(text),
            (None, Some(value)) => serde_json::to_vec(&value)
                .map(Bytes::from)
                .map_err(|e| IngestError::MalformedEnvelope(e.to_string()))?,
        };

        Ok(Envelope {
            spec_version: event.specversion.parse()?,
            id: event.id,
            source: event.source,
            event_type: event.event_type,
            subject: event.subject,
            data_content_type: event.datacontenttype,
            data,
        })
    }

    fn validate(&self) -> Result<(), IngestError> {
        for (name, value) in [
            ("id", &self.id),
            ("source", &self.source),
            ("type", &self.event_type),
        ] {
            if value.is_empty() {
                return Err(IngestError::MalformedEnvelope(format!(
                    "missing required attribute {name}"
                )));
            }
        }
        Ok(())
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_json_media_type(content_type: &str) -> bool {
    let media = media_type(content_type);
    media == "application/json" || media == "text/json" || media.ends_with("+json")
}
