use std::collections::HashMap;

use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Deserializer};

use crate::api::IngestError;
use crate::envelope::Envelope;
use crate::json::{self, from_object_slice};

/// A Pub/Sub push delivery, as carried in the data of a `messagePublished` event.
#[derive(Debug, Deserialize)]
pub struct Notification {
    #[serde(deserialize_with = "json::object")]
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: String,
}

#[derive(Debug, Deserialize)]
pub struct PushMessage {
    /// Raw message data. Missing or null data decodes to an empty payload.
    #[serde(default, deserialize_with = "deserialize_base64")]
    pub data: Bytes,
    #[serde(default, alias = "messageId", alias = "message_id")]
    pub id: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default, alias = "publishTime")]
    pub publish_time: Option<String>,
}

impl Notification {
    pub fn from_envelope(envelope: &Envelope) -> Result<Notification, IngestError> {
        Self::from_slice(&envelope.data)
    }

    pub fn from_slice(data: &[u8]) -> Result<Notification, IngestError> {
        from_object_slice(data).map_err(|e| IngestError::MalformedNotification(e.to_string()))
    }
}

fn deserialize_base64<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(Bytes::new()),
        Some(encoded) => base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom),
    }
}
