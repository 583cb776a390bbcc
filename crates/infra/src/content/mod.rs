//! Content collaborators of the orchestrator: the catalog of selectable
//! scenes/aesthetics/characters/templates and the pure prompt builders.

pub mod catalog;
pub mod prompt;

pub use catalog::{Aesthetic, Catalog, Character, InMemoryCatalog, Scene, VideoTemplate};
pub use prompt::BusinessContext;
