//! Generation job endpoints: submission per kind, status polling, listing.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use shopreel_infra::jobs::{JobId, DEFAULT_LIST_LIMIT};
use shopreel_infra::requests::ResolveInput;

use crate::app::dto::{
    CharacterVideoRequest, ListJobsQuery, ListJobsResponse, ScenePhotoRequest, ShopVideoRequest,
    TemplatedVideoRequest,
};
use crate::app::{errors, services::AppServices};
use crate::context::{TenantContext, UserContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_jobs))
        .route("/:job_id", get(get_job))
        .route("/scene-photos", post(submit_scene_photo))
        .route("/shop-videos", post(submit_shop_video))
        .route("/character-videos", post(submit_character_video))
        .route("/templated-videos", post(submit_templated_video))
}

/// Resolve and submit; answers 202 with the pending job handle.
async fn submit<R: ResolveInput>(
    services: Arc<AppServices>,
    tenant: TenantContext,
    user: UserContext,
    body: Result<Json<R>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                rejection.body_text(),
            );
        }
    };

    match services
        .orchestrator
        .submit_request(
            tenant.tenant_id(),
            user.user_id(),
            &request,
            services.catalog.as_ref(),
        )
        .await
    {
        Ok(handle) => (StatusCode::ACCEPTED, Json(handle)).into_response(),
        Err(e) => errors::orchestrator_error_to_response(e),
    }
}

/// POST /jobs/scene-photos
pub async fn submit_scene_photo(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(user): Extension<UserContext>,
    body: Result<Json<ScenePhotoRequest>, JsonRejection>,
) -> Response {
    submit(services, tenant, user, body).await
}

/// POST /jobs/shop-videos
///
/// Still image first, then animated into a clip.
pub async fn submit_shop_video(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(user): Extension<UserContext>,
    body: Result<Json<ShopVideoRequest>, JsonRejection>,
) -> Response {
    submit(services, tenant, user, body).await
}

/// POST /jobs/character-videos
pub async fn submit_character_video(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(user): Extension<UserContext>,
    body: Result<Json<CharacterVideoRequest>, JsonRejection>,
) -> Response {
    submit(services, tenant, user, body).await
}

/// POST /jobs/templated-videos
pub async fn submit_templated_video(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(user): Extension<UserContext>,
    body: Result<Json<TemplatedVideoRequest>, JsonRejection>,
) -> Response {
    submit(services, tenant, user, body).await
}

/// GET /jobs/:job_id
///
/// Jobs of other tenants are reported as 404.
pub async fn get_job(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(job_id): Path<String>,
) -> Response {
    let job_id = match JobId::from_str(&job_id) {
        Ok(id) => id,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()),
    };

    match services.orchestrator.get_status(tenant.tenant_id(), job_id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::orchestrator_error_to_response(e),
    }
}

/// GET /jobs?limit=N
pub async fn list_jobs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Query(query): Query<ListJobsQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    match services.orchestrator.list(tenant.tenant_id(), limit).await {
        Ok(jobs) => Json(ListJobsResponse { jobs }).into_response(),
        Err(e) => errors::orchestrator_error_to_response(e),
    }
}
