use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::contest::{Carrier, Scorecard};

pub const KIND_CONNECT: &str = "connect";
pub const KIND_CARRIER: &str = "carrier";
pub const KIND_SCORECARD: &str = "scorecard";

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} message carries no payload")]
    MissingPayload(String),
    #[error("unknown message type '{0}'")]
    UnknownKind(String),
    #[error("encoding {kind} failed: {source}")]
    Encode {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Wire frame. `data` holds the payload as an embedded JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Envelope {
    pub fn wrap<T: Serialize>(
        kind: &str,
        item_type: Option<&str>,
        payload: &T,
    ) -> Result<Self, CodecError> {
        let data = serde_json::to_string(payload).map_err(|source| CodecError::Encode {
            kind: kind.to_string(),
            source,
        })?;
        Ok(Self {
            kind: kind.to_string(),
            item_type: item_type.map(str::to_string),
            data: Some(data),
        })
    }

    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|source| CodecError::Encode {
            kind: self.kind.clone(),
            source,
        })
    }

    pub fn decode(text: &str) -> Result<Self, CodecError> {
        serde_json::from_str(text).map_err(CodecError::Envelope)
    }

    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        let data = self
            .data
            .as_deref()
            .ok_or_else(|| CodecError::MissingPayload(self.kind.clone()))?;
        serde_json::from_str(data).map_err(|source| CodecError::Payload {
            kind: self.kind.clone(),
            source,
        })
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

/// Serializes `payload` into an envelope and the envelope into a text frame.
pub fn encode<T: Serialize>(
    kind: &str,
    item_type: Option<&str>,
    payload: &T,
) -> Result<String, CodecError> {
    Envelope::wrap(kind, item_type, payload)?.encode()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Connect(String),
    Carrier(Carrier),
    Scorecard(Box<Scorecard>),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Connect(_) => KIND_CONNECT,
            Message::Carrier(_) => KIND_CARRIER,
            Message::Scorecard(_) => KIND_SCORECARD,
        }
    }

    pub fn to_envelope(&self) -> Result<Envelope, CodecError> {
        match self {
            Message::Connect(device_id) => Envelope::wrap(KIND_CONNECT, None, device_id),
            Message::Carrier(carrier) => Envelope::wrap(KIND_CARRIER, None, carrier),
            Message::Scorecard(scorecard) => Envelope::wrap(KIND_SCORECARD, None, scorecard),
        }
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self, CodecError> {
        match envelope.kind.as_str() {
            KIND_CONNECT => envelope.decode_payload().map(Message::Connect),
            KIND_CARRIER => envelope.decode_payload().map(Message::Carrier),
            KIND_SCORECARD => envelope
                .decode_payload()
                .map(|s| Message::Scorecard(Box::new(s))),
            other => Err(CodecError::UnknownKind(other.to_string())),
        }
    }

    pub fn encode(&self) -> Result<String, CodecError> {
        self.to_envelope()?.encode()
    }
}
