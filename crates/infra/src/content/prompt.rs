//! Prompt assembly. Pure string building, no I/O.
//!
//! Callers must have checked that every referenced catalog entry exists.

use serde::{Deserialize, Serialize};

use super::catalog::{Aesthetic, Character, Scene, VideoTemplate};

/// What the shop tells us about itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BusinessContext {
    pub shop_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specialties: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
}

impl BusinessContext {
    fn located(&self) -> String {
        match &self.city {
            Some(city) if !city.trim().is_empty() => format!("{} in {}", self.shop_name, city.trim()),
            _ => self.shop_name.clone(),
        }
    }

    fn specialties_phrase(&self) -> Option<String> {
        let items: Vec<&str> = self
            .specialties
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        match items.as_slice() {
            [] => None,
            [one] => Some((*one).to_string()),
            [rest @ .., last] => Some(format!("{} and {}", rest.join(", "), last)),
        }
    }
}

pub fn scene_photo_prompt(scene: &Scene, aesthetic: &Aesthetic, business: &BusinessContext) -> String {
    let mut prompt = format!(
        "Professional marketing photograph of {} at {}. Style: {}.",
        scene.description,
        business.located(),
        aesthetic.style
    );
    if let Some(specialties) = business.specialties_phrase() {
        prompt.push_str(&format!(" The shop specializes in {specialties}."));
    }
    prompt.push_str(" Photorealistic, no text overlays, no visible brand logos other than the shop's.");
    prompt
}

/// Motion prompt for animating a scene still into a short clip.
pub fn shop_motion_prompt(scene: &Scene, aesthetic: &Aesthetic) -> String {
    format!(
        "Animate this photo: {}. Keep the {} look, subtle natural movement, no cuts.",
        scene.motion,
        aesthetic.name.to_lowercase()
    )
}

pub fn character_video_prompt(
    character: &Character,
    script: &str,
    business: &BusinessContext,
) -> String {
    format!(
        "{} at {}, {}. They say: \"{}\"",
        capitalize(&character.appearance),
        business.located(),
        character.delivery,
        script.trim()
    )
}

pub fn templated_video_prompt(
    template: &VideoTemplate,
    business: &BusinessContext,
    offer: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Promotional video for {}: {}.",
        business.located(),
        template.structure
    );
    if let Some(offer) = offer.map(str::trim).filter(|o| !o.is_empty()) {
        prompt.push_str(&format!(" Featured offer: {offer}."));
    }
    if let Some(specialties) = business.specialties_phrase() {
        prompt.push_str(&format!(" Highlight {specialties}."));
    }
    prompt
}

/// Short social caption stored next to the result.
pub fn caption(business: &BusinessContext) -> String {
    let mut caption = business.located();
    if let Some(specialties) = business.specialties_phrase() {
        caption.push_str(&format!(": {specialties}"));
    }
    caption.push('.');
    if let Some(tagline) = business.tagline.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        caption.push(' ');
        caption.push_str(tagline);
    }
    caption
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::catalog::{Catalog, InMemoryCatalog};

    fn business() -> BusinessContext {
        BusinessContext {
            shop_name: "Rivera Auto".to_string(),
            city: Some("Tucson".to_string()),
            specialties: vec!["brakes".to_string(), "alignments".to_string(), "AC".to_string()],
            tagline: Some("Honest work since 1998.".to_string()),
        }
    }

    #[test]
    fn scene_prompt_mentions_scene_style_and_shop() {
        let catalog = InMemoryCatalog::with_defaults();
        let scene = catalog.scene("service-bay").unwrap();
        let aesthetic = catalog.aesthetic("golden-hour").unwrap();

        let prompt = scene_photo_prompt(&scene, &aesthetic, &business());

        assert!(prompt.contains("two-post lift"));
        assert!(prompt.contains("warm late-afternoon sunlight"));
        assert!(prompt.contains("Rivera Auto in Tucson"));
        assert!(prompt.contains("brakes, alignments and AC"));
    }

    #[test]
    fn character_prompt_quotes_the_script() {
        let catalog = InMemoryCatalog::with_defaults();
        let character = catalog.character("friendly-mechanic").unwrap();

        let prompt = character_video_prompt(&character, "  Free brake checks all month!  ", &business());

        assert!(prompt.starts_with("A mechanic"));
        assert!(prompt.ends_with("\"Free brake checks all month!\""));
    }

    #[test]
    fn caption_skips_missing_parts() {
        assert_eq!(
            caption(&business()),
            "Rivera Auto in Tucson: brakes, alignments and AC. Honest work since 1998."
        );

        let bare = BusinessContext {
            shop_name: "Bay 9".to_string(),
            ..Default::default()
        };
        assert_eq!(caption(&bare), "Bay 9.");
    }

    #[test]
    fn templated_prompt_includes_offer_when_given() {
        let catalog = InMemoryCatalog::with_defaults();
        let template = catalog.template("seasonal-special").unwrap();

        let with_offer = templated_video_prompt(&template, &business(), Some("20% off brakes"));
        let without = templated_video_prompt(&template, &business(), Some("   "));

        assert!(with_offer.contains("Featured offer: 20% off brakes."));
        assert!(!without.contains("Featured offer"));
    }
}
