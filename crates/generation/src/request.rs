//! Provider-agnostic generation request and options.

use serde::{Deserialize, Serialize};

use crate::media::{GeneratedMedia, MediaKind};

/// Output frame shape requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Classic,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Classic => "4:3",
        }
    }
}

/// Video output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "1080p")]
    FullHd,
}

/// Still image handed to an image-to-video call.
///
/// Only ever built at execution time from a previous phase's output; it is
/// not persisted with the job input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl From<GeneratedMedia> for ReferenceImage {
    fn from(media: GeneratedMedia) -> Self {
        Self {
            mime_type: media.mime_type,
            bytes: media.bytes,
        }
    }
}

/// Small enumerated configuration passed along with a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub aspect_ratio: AspectRatio,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip)]
    pub reference_image: Option<ReferenceImage>,
}

impl GenerationOptions {
    pub fn new(aspect_ratio: AspectRatio) -> Self {
        Self {
            aspect_ratio,
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_reference_image(mut self, image: ReferenceImage) -> Self {
        self.reference_image = Some(image);
        self
    }
}

/// A single call to the provider: what to make, from which prompt, with which options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub output: MediaKind,
    pub prompt: String,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn image(prompt: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            output: MediaKind::Image,
            prompt: prompt.into(),
            options,
        }
    }

    pub fn video(prompt: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            output: MediaKind::Video,
            prompt: prompt.into(),
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_image_is_not_persisted() {
        let request = GenerationRequest::video(
            "slow push-in",
            GenerationOptions::new(AspectRatio::Portrait)
                .with_duration(8)
                .with_reference_image(ReferenceImage {
                    mime_type: "image/png".to_string(),
                    bytes: vec![1, 2, 3],
                }),
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["options"]["aspect_ratio"], "9:16");
        assert_eq!(json["options"]["duration_seconds"], 8);
        assert!(json["options"].get("reference_image").is_none());

        let back: GenerationRequest = serde_json::from_value(json).unwrap();
        assert!(back.options.reference_image.is_none());
    }
}
