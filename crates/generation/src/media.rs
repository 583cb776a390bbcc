//! Media returned by the provider.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// What kind of asset a call produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// Binary output of a successful generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedMedia {
    pub kind: MediaKind,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Provider-specific details (model name, seed, timings).
    pub metadata: JsonValue,
}

impl GeneratedMedia {
    pub fn new(kind: MediaKind, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            mime_type: mime_type.into(),
            bytes,
            metadata: JsonValue::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension matching the mime type, used by asset stores.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "video/mp4" => "mp4",
            "video/webm" => "webm",
            "video/quicktime" => "mov",
            _ => match self.kind {
                MediaKind::Image => "img",
                MediaKind::Video => "vid",
            },
        }
    }
}
