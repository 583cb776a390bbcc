//! Submission requests and their synchronous resolution into job input.
//!
//! Resolution runs before any job exists: unknown catalog ids and malformed
//! fields are reported to the caller and no job is created.

use serde::Deserialize;
use thiserror::Error;

use shopreel_generation::{AspectRatio, GenerationOptions, GenerationRequest, Resolution};

use crate::content::catalog::Catalog;
use crate::content::prompt::{self, BusinessContext};
use crate::jobs::types::{ResolvedInput, SinglePhaseInput, TwoPhaseInput};

pub const MIN_VIDEO_SECONDS: u32 = 4;
pub const MAX_VIDEO_SECONDS: u32 = 8;
pub const MAX_SCRIPT_CHARS: usize = 500;
pub const MAX_OFFER_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl ResolveError {
    fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// A submission that can be turned into a [`ResolvedInput`].
pub trait ResolveInput: Send + Sync {
    fn resolve(&self, catalog: &dyn Catalog) -> Result<ResolvedInput, ResolveError>;
}

fn default_video_seconds() -> u32 {
    MAX_VIDEO_SECONDS
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePhotoRequest {
    pub scene_id: String,
    pub aesthetic_id: String,
    pub business: BusinessContext,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopVideoRequest {
    pub scene_id: String,
    pub aesthetic_id: String,
    pub business: BusinessContext,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default = "default_video_seconds")]
    pub duration_seconds: u32,
    #[serde(default)]
    pub resolution: Option<Resolution>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterVideoRequest {
    pub character_id: String,
    pub script: String,
    pub business: BusinessContext,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default = "default_video_seconds")]
    pub duration_seconds: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatedVideoRequest {
    pub template_id: String,
    pub business: BusinessContext,
    #[serde(default)]
    pub offer: Option<String>,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default = "default_video_seconds")]
    pub duration_seconds: u32,
}

fn check_business(business: &BusinessContext) -> Result<(), ResolveError> {
    if business.shop_name.trim().is_empty() {
        return Err(ResolveError::invalid("business.shopName must not be empty"));
    }
    Ok(())
}

fn check_duration(seconds: u32) -> Result<(), ResolveError> {
    if !(MIN_VIDEO_SECONDS..=MAX_VIDEO_SECONDS).contains(&seconds) {
        return Err(ResolveError::invalid(format!(
            "durationSeconds must be between {MIN_VIDEO_SECONDS} and {MAX_VIDEO_SECONDS}"
        )));
    }
    Ok(())
}

fn not_found(entity: &'static str, id: &str) -> ResolveError {
    ResolveError::NotFound {
        entity,
        id: id.to_string(),
    }
}

impl ResolveInput for ScenePhotoRequest {
    fn resolve(&self, catalog: &dyn Catalog) -> Result<ResolvedInput, ResolveError> {
        check_business(&self.business)?;
        let scene = catalog
            .scene(&self.scene_id)
            .ok_or_else(|| not_found("scene", &self.scene_id))?;
        let aesthetic = catalog
            .aesthetic(&self.aesthetic_id)
            .ok_or_else(|| not_found("aesthetic", &self.aesthetic_id))?;

        Ok(ResolvedInput::ScenePhoto(SinglePhaseInput {
            request: GenerationRequest::image(
                prompt::scene_photo_prompt(&scene, &aesthetic, &self.business),
                GenerationOptions::new(self.aspect_ratio),
            ),
            caption: Some(prompt::caption(&self.business)),
        }))
    }
}

impl ResolveInput for ShopVideoRequest {
    fn resolve(&self, catalog: &dyn Catalog) -> Result<ResolvedInput, ResolveError> {
        check_business(&self.business)?;
        check_duration(self.duration_seconds)?;
        let scene = catalog
            .scene(&self.scene_id)
            .ok_or_else(|| not_found("scene", &self.scene_id))?;
        let aesthetic = catalog
            .aesthetic(&self.aesthetic_id)
            .ok_or_else(|| not_found("aesthetic", &self.aesthetic_id))?;

        let mut motion_options =
            GenerationOptions::new(self.aspect_ratio).with_duration(self.duration_seconds);
        if let Some(resolution) = self.resolution {
            motion_options = motion_options.with_resolution(resolution);
        }

        Ok(ResolvedInput::ShopVideo(TwoPhaseInput {
            still: GenerationRequest::image(
                prompt::scene_photo_prompt(&scene, &aesthetic, &self.business),
                GenerationOptions::new(self.aspect_ratio),
            ),
            motion: GenerationRequest::video(
                prompt::shop_motion_prompt(&scene, &aesthetic),
                motion_options,
            ),
            caption: Some(prompt::caption(&self.business)),
        }))
    }
}

impl ResolveInput for CharacterVideoRequest {
    fn resolve(&self, catalog: &dyn Catalog) -> Result<ResolvedInput, ResolveError> {
        check_business(&self.business)?;
        check_duration(self.duration_seconds)?;
        let script = self.script.trim();
        if script.is_empty() {
            return Err(ResolveError::invalid("script must not be empty"));
        }
        if script.chars().count() > MAX_SCRIPT_CHARS {
            return Err(ResolveError::invalid(format!(
                "script must be at most {MAX_SCRIPT_CHARS} characters"
            )));
        }
        let character = catalog
            .character(&self.character_id)
            .ok_or_else(|| not_found("character", &self.character_id))?;

        Ok(ResolvedInput::CharacterVideo(SinglePhaseInput {
            request: GenerationRequest::video(
                prompt::character_video_prompt(&character, script, &self.business),
                GenerationOptions::new(self.aspect_ratio).with_duration(self.duration_seconds),
            ),
            caption: Some(prompt::caption(&self.business)),
        }))
    }
}

impl ResolveInput for TemplatedVideoRequest {
    fn resolve(&self, catalog: &dyn Catalog) -> Result<ResolvedInput, ResolveError> {
        check_business(&self.business)?;
        check_duration(self.duration_seconds)?;
        if let Some(offer) = &self.offer {
            if offer.chars().count() > MAX_OFFER_CHARS {
                return Err(ResolveError::invalid(format!(
                    "offer must be at most {MAX_OFFER_CHARS} characters"
                )));
            }
        }
        let template = catalog
            .template(&self.template_id)
            .ok_or_else(|| not_found("template", &self.template_id))?;

        Ok(ResolvedInput::TemplatedVideo(SinglePhaseInput {
            request: GenerationRequest::video(
                prompt::templated_video_prompt(&template, &self.business, self.offer.as_deref()),
                GenerationOptions::new(self.aspect_ratio).with_duration(self.duration_seconds),
            ),
            caption: Some(prompt::caption(&self.business)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shopreel_generation::MediaKind;

    use super::*;
    use crate::content::catalog::InMemoryCatalog;
    use crate::jobs::types::JobKind;

    fn business() -> serde_json::Value {
        json!({ "shopName": "Rivera Auto", "city": "Tucson", "specialties": ["brakes"] })
    }

    #[test]
    fn shop_video_resolves_into_two_phases() {
        let req: ShopVideoRequest = serde_json::from_value(json!({
            "sceneId": "service-bay",
            "aestheticId": "golden-hour",
            "business": business(),
            "aspectRatio": "9:16",
            "resolution": "1080p",
        }))
        .unwrap();

        let input = req.resolve(&InMemoryCatalog::with_defaults()).unwrap();

        assert_eq!(input.kind(), JobKind::ShopVideo);
        let ResolvedInput::ShopVideo(two) = input else {
            panic!("expected shop video input");
        };
        assert_eq!(two.still.output, MediaKind::Image);
        assert_eq!(two.motion.output, MediaKind::Video);
        assert_eq!(two.motion.options.duration_seconds, Some(8));
        assert_eq!(two.motion.options.resolution, Some(Resolution::FullHd));
        assert_eq!(two.motion.options.aspect_ratio, AspectRatio::Portrait);
        assert!(two.motion.options.reference_image.is_none());
        assert_eq!(two.caption.as_deref(), Some("Rivera Auto in Tucson: brakes."));
    }

    #[test]
    fn unknown_catalog_ids_are_not_found() {
        let catalog = InMemoryCatalog::with_defaults();
        let req: ScenePhotoRequest = serde_json::from_value(json!({
            "sceneId": "service-bay",
            "aestheticId": "neon-vaporwave",
            "business": business(),
        }))
        .unwrap();

        assert_eq!(
            req.resolve(&catalog),
            Err(ResolveError::NotFound {
                entity: "aesthetic",
                id: "neon-vaporwave".to_string(),
            })
        );
    }

    #[test]
    fn character_script_is_validated() {
        let catalog = InMemoryCatalog::with_defaults();
        let mut req: CharacterVideoRequest = serde_json::from_value(json!({
            "characterId": "friendly-mechanic",
            "script": "   ",
            "business": business(),
        }))
        .unwrap();
        assert!(matches!(req.resolve(&catalog), Err(ResolveError::Invalid(_))));

        req.script = "x".repeat(MAX_SCRIPT_CHARS + 1);
        assert!(matches!(req.resolve(&catalog), Err(ResolveError::Invalid(_))));

        req.script = "Brake check, on us.".to_string();
        assert_eq!(req.resolve(&catalog).unwrap().kind(), JobKind::CharacterVideo);
    }

    #[test]
    fn duration_and_shop_name_are_validated() {
        let catalog = InMemoryCatalog::with_defaults();
        let mut req: TemplatedVideoRequest = serde_json::from_value(json!({
            "templateId": "seasonal-special",
            "business": business(),
            "durationSeconds": 12,
        }))
        .unwrap();
        assert!(matches!(req.resolve(&catalog), Err(ResolveError::Invalid(_))));

        req.duration_seconds = 6;
        req.business.shop_name = " ".to_string();
        assert!(matches!(req.resolve(&catalog), Err(ResolveError::Invalid(_))));

        req.business.shop_name = "Rivera Auto".to_string();
        assert!(req.resolve(&catalog).is_ok());
    }
}
