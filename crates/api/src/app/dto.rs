use serde::{Deserialize, Serialize};

use shopreel_infra::jobs::JobView;

// -------------------------
// Request DTOs
// -------------------------

// Submission bodies are the request types of `shopreel_infra::requests`.
pub use shopreel_infra::requests::{
    CharacterVideoRequest, ScenePhotoRequest, ShopVideoRequest, TemplatedVideoRequest,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    pub limit: Option<usize>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobView>,
}
