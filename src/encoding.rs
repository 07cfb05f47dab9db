//! Payload encodings: raw text, JSON and YAML.
//!
//! Structured documents of both formats share one model, an ordered [`serde_yaml::Value`].
//! YAML is a superset of JSON, so a document loaded from a JSON file can be sent as YAML
//! and the other way around, and key order survives a round trip through the peer.

use std::fmt;

use log::*;
use serde::Serialize;
use serde_yaml::Value;

use crate::error::SerializationError;

/// How a [`Payload`] is turned into the body of one text message, and how a reply is read
/// back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// The message body is the text itself.
    #[default]
    Raw,
    /// Compact JSON.
    Json,
    /// Block-style YAML as produced by `serde_yaml`.
    Yaml,
}

/// The logical message exchanged with the peer.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A plain string.
    Text(String),
    /// A structured document (mapping, sequence or non-string scalar).
    Document(Value),
}

impl Payload {
    /// Build a document payload from any serializable value.
    pub fn document<T: Serialize>(value: &T) -> Result<Self, SerializationError> {
        Ok(Payload::from(serde_yaml::to_value(value)?))
    }

    /// Returns the text if this is a [`Payload::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Document(_) => None,
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl<'s> From<&'s str> for Payload {
    fn from(text: &'s str) -> Self {
        Payload::Text(text.to_owned())
    }
}

impl From<Value> for Payload {
    /// A bare string scalar is the same message as raw text.
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Payload::Text(text),
            other => Payload::Document(other),
        }
    }
}

impl fmt::Display for Payload {
    /// Renders documents as compact JSON, falling back to the YAML debug form for
    /// documents JSON cannot express.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Payload::Text(text) => f.write_str(text),
            Payload::Document(doc) => match serde_json::to_string(doc) {
                Ok(json) => f.write_str(&json),
                Err(_) => write!(f, "{:?}", doc),
            },
        }
    }
}

impl Encoding {
    /// Whether payloads go through a serializer.
    pub fn is_structured(self) -> bool {
        !matches!(self, Encoding::Raw)
    }

    /// Short name used in confirmation lines ("JSON data sent").
    pub fn label(self) -> &'static str {
        match self {
            Encoding::Raw => "Text",
            Encoding::Json => "JSON",
            Encoding::Yaml => "YAML",
        }
    }

    /// Serialize `payload` into the body of one text message.
    ///
    /// Raw text is sent as is. A structured document cannot be sent raw.
    pub fn encode(self, payload: &Payload) -> Result<String, SerializationError> {
        let body = match (self, payload) {
            (Encoding::Raw, Payload::Text(text)) => text.clone(),
            (Encoding::Raw, Payload::Document(_)) => {
                return Err(SerializationError::DocumentAsRawText)
            }
            (Encoding::Json, Payload::Text(text)) => serde_json::to_string(text)?,
            (Encoding::Json, Payload::Document(doc)) => serde_json::to_string(doc)?,
            (Encoding::Yaml, Payload::Text(text)) => serde_yaml::to_string(text)?,
            (Encoding::Yaml, Payload::Document(doc)) => serde_yaml::to_string(doc)?,
        };
        trace!("Encoded {:?} payload into {} bytes", self, body.len());
        Ok(body)
    }

    /// Parse the body of a received message.
    ///
    /// No schema is enforced: any well-formed document is accepted.
    pub fn decode(self, body: &str) -> Result<Payload, SerializationError> {
        match self {
            Encoding::Raw => Ok(Payload::Text(body.to_owned())),
            Encoding::Json => Ok(serde_json::from_str::<Value>(body)?.into()),
            Encoding::Yaml => Ok(serde_yaml::from_str::<Value>(body)?.into()),
        }
    }
}
