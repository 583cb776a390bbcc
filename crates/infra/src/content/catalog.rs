use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A shop location to photograph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Camera move used when the scene is animated.
    pub motion: String,
}

/// Visual style applied on top of a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aesthetic {
    pub id: String,
    pub name: String,
    pub style: String,
}

/// Spokesperson for character-driven videos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub appearance: String,
    pub delivery: String,
}

/// Structured promo video layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoTemplate {
    pub id: String,
    pub name: String,
    pub structure: String,
}

/// Read-only lookup of selectable content by id.
pub trait Catalog: Send + Sync + 'static {
    fn scene(&self, id: &str) -> Option<Scene>;
    fn aesthetic(&self, id: &str) -> Option<Aesthetic>;
    fn character(&self, id: &str) -> Option<Character>;
    fn template(&self, id: &str) -> Option<VideoTemplate>;
}

impl<C> Catalog for Arc<C>
where
    C: Catalog + ?Sized,
{
    fn scene(&self, id: &str) -> Option<Scene> {
        (**self).scene(id)
    }

    fn aesthetic(&self, id: &str) -> Option<Aesthetic> {
        (**self).aesthetic(id)
    }

    fn character(&self, id: &str) -> Option<Character> {
        (**self).character(id)
    }

    fn template(&self, id: &str) -> Option<VideoTemplate> {
        (**self).template(id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    scenes: HashMap<String, Scene>,
    aesthetics: HashMap<String, Aesthetic>,
    characters: HashMap<String, Character>,
    templates: HashMap<String, VideoTemplate>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the stock content shipped with the service.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        for (id, name, description, motion) in [
            (
                "service-bay",
                "Service bay",
                "a clean, well-lit service bay with a car raised on a two-post lift and organized tool chests",
                "slow dolly forward under the raised car",
            ),
            (
                "front-desk",
                "Front desk",
                "a welcoming customer counter with a service advisor and a tidy waiting area",
                "gentle pan from the entrance to the counter",
            ),
            (
                "tire-shop",
                "Tire shop",
                "a tire changing station with a balancer and neatly racked new tires",
                "orbit around the wheel balancer",
            ),
            (
                "storefront",
                "Storefront",
                "the exterior of an independent auto repair shop with open roll-up doors",
                "rising crane shot revealing the shop sign",
            ),
        ] {
            catalog.insert_scene(Scene {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                motion: motion.to_string(),
            });
        }

        for (id, name, style) in [
            ("golden-hour", "Golden hour", "warm late-afternoon sunlight, long soft shadows"),
            ("studio-clean", "Studio clean", "bright even lighting, crisp whites, commercial polish"),
            ("gritty-garage", "Gritty garage", "moody contrast, textured concrete, cinematic grade"),
        ] {
            catalog.insert_aesthetic(Aesthetic {
                id: id.to_string(),
                name: name.to_string(),
                style: style.to_string(),
            });
        }

        for (id, name, appearance, delivery) in [
            (
                "friendly-mechanic",
                "Friendly mechanic",
                "a mechanic in a navy work shirt with a name patch, standing beside a workbench",
                "warm, confident, speaking directly to camera",
            ),
            (
                "service-advisor",
                "Service advisor",
                "a service advisor in a branded polo holding a tablet at the front counter",
                "upbeat and reassuring",
            ),
        ] {
            catalog.insert_character(Character {
                id: id.to_string(),
                name: name.to_string(),
                appearance: appearance.to_string(),
                delivery: delivery.to_string(),
            });
        }

        for (id, name, structure) in [
            (
                "seasonal-special",
                "Seasonal special",
                "open on the storefront, cut to technicians at work, end on the offer in large type",
            ),
            (
                "before-after",
                "Before and after",
                "split-screen reveal of a worn part next to the new replacement, then the shop logo",
            ),
        ] {
            catalog.insert_template(VideoTemplate {
                id: id.to_string(),
                name: name.to_string(),
                structure: structure.to_string(),
            });
        }

        catalog
    }

    pub fn insert_scene(&mut self, scene: Scene) {
        self.scenes.insert(scene.id.clone(), scene);
    }

    pub fn insert_aesthetic(&mut self, aesthetic: Aesthetic) {
        self.aesthetics.insert(aesthetic.id.clone(), aesthetic);
    }

    pub fn insert_character(&mut self, character: Character) {
        self.characters.insert(character.id.clone(), character);
    }

    pub fn insert_template(&mut self, template: VideoTemplate) {
        self.templates.insert(template.id.clone(), template);
    }
}

impl Catalog for InMemoryCatalog {
    fn scene(&self, id: &str) -> Option<Scene> {
        self.scenes.get(id).cloned()
    }

    fn aesthetic(&self, id: &str) -> Option<Aesthetic> {
        self.aesthetics.get(id).cloned()
    }

    fn character(&self, id: &str) -> Option<Character> {
        self.characters.get(id).cloned()
    }

    fn template(&self, id: &str) -> Option<VideoTemplate> {
        self.templates.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_addressable_by_id() {
        let catalog = InMemoryCatalog::with_defaults();

        assert_eq!(catalog.scene("service-bay").unwrap().name, "Service bay");
        assert!(catalog.aesthetic("golden-hour").is_some());
        assert!(catalog.character("friendly-mechanic").is_some());
        assert!(catalog.template("seasonal-special").is_some());
        assert!(catalog.scene("moon-base").is_none());
    }
}
