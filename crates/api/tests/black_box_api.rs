use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use shopreel_api::app::services::AppServices;
use shopreel_core::{TenantId, UserId};
use shopreel_generation::{PollConfig, PollingClient, StubProvider};
use shopreel_infra::{
    assets::InMemoryAssetStore,
    content::InMemoryCatalog,
    jobs::{ExecutionContext, InMemoryJobStore, OrchestratorHandle},
    OrchestratorConfig,
};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    _orchestrator: OrchestratorHandle,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, fast stub provider, ephemeral port.
        let config = OrchestratorConfig {
            retry_backoff: Duration::from_millis(10),
            poll_interval: Duration::from_millis(5),
            ..OrchestratorConfig::default()
        };
        let client = PollingClient::new(
            StubProvider::new(2),
            PollConfig {
                interval: config.poll_interval,
                max_attempts: config.max_poll_attempts,
            },
        );
        let (services, orchestrator) = AppServices::start(
            ExecutionContext {
                store: InMemoryJobStore::arc(),
                client: Arc::new(client),
                assets: Arc::new(InMemoryAssetStore::new()),
                config,
            },
            Arc::new(InMemoryCatalog::with_defaults()),
        );

        let app = shopreel_api::app::build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            handle,
            _orchestrator: orchestrator,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Clone, Copy)]
struct Caller {
    tenant_id: TenantId,
    user_id: UserId,
}

impl Caller {
    fn new() -> Self {
        Self {
            tenant_id: TenantId::new(),
            user_id: UserId::new(),
        }
    }

    fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("x-tenant-id", self.tenant_id.to_string())
            .header("x-user-id", self.user_id.to_string())
    }
}

fn business() -> serde_json::Value {
    json!({
        "shopName": "Rivera Auto",
        "city": "Tucson",
        "specialties": ["brakes", "alignments"],
        "tagline": "Honest work since 1998."
    })
}

async fn wait_terminal(
    client: &reqwest::Client,
    base_url: &str,
    caller: Caller,
    id: &str,
) -> serde_json::Value {
    // Execution is detached from the submit call; poll like a client would.
    for _ in 0..200 {
        let res = caller
            .apply(client.get(format!("{}/jobs/{}", base_url, id)))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();

        let status = body["status"].as_str().unwrap();
        if status == "completed" || status == "failed" {
            return body;
        }
        let progress = body["progress"].as_u64().unwrap();
        assert!(progress < 100);

        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("job did not reach a terminal state within timeout");
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn tenant_headers_required_for_job_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/jobs", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/jobs", srv.base_url))
        .header("x-tenant-id", "not-a-uuid")
        .header("x-user-id", UserId::new().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn scene_photo_lifecycle_submit_poll_complete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let caller = Caller::new();

    let res = caller
        .apply(client.post(format!("{}/jobs/scene-photos", srv.base_url)))
        .json(&json!({
            "sceneId": "service-bay",
            "aestheticId": "golden-hour",
            "business": business(),
            "aspectRatio": "1:1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let handle: serde_json::Value = res.json().await.unwrap();
    assert_eq!(handle["status"], "pending");
    assert_eq!(handle["progress"], 0);
    assert!(handle["createdAt"].is_string());
    let id = handle["id"].as_str().unwrap().to_string();

    let done = wait_terminal(&client, &srv.base_url, caller, &id).await;

    assert_eq!(done["status"], "completed");
    assert_eq!(done["progress"], 100);
    assert_eq!(done["kind"], "scene-photo");
    let url = done["resultUrl"].as_str().unwrap();
    assert!(url.starts_with("memory://"));
    assert!(url.ends_with(&format!("{id}.png")));
    assert_eq!(
        done["caption"],
        "Rivera Auto in Tucson: brakes and alignments. Honest work since 1998."
    );
    assert!(done["completedAt"].is_string());
    assert!(done["startedAt"].is_string());
    assert!(done.get("error").is_none());
}

#[tokio::test]
async fn shop_video_runs_both_phases() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let caller = Caller::new();

    let res = caller
        .apply(client.post(format!("{}/jobs/shop-videos", srv.base_url)))
        .json(&json!({
            "sceneId": "storefront",
            "aestheticId": "studio-clean",
            "business": business(),
            "durationSeconds": 6
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let id = res.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let done = wait_terminal(&client, &srv.base_url, caller, &id).await;

    assert_eq!(done["status"], "completed");
    assert_eq!(done["kind"], "shop-video");
    assert!(done["resultUrl"].as_str().unwrap().ends_with(".mp4"));
}

#[tokio::test]
async fn character_and_templated_videos_complete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let caller = Caller::new();

    let submissions = [
        (
            "character-videos",
            json!({
                "characterId": "friendly-mechanic",
                "script": "Free brake inspection with every oil change this month.",
                "business": business(),
                "aspectRatio": "9:16"
            }),
        ),
        (
            "templated-videos",
            json!({
                "templateId": "before-after",
                "business": business(),
                "offer": "$20 off alignments"
            }),
        ),
    ];

    for (path, body) in submissions {
        let res = caller
            .apply(client.post(format!("{}/jobs/{}", srv.base_url, path)))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED, "{path}");
        let id = res.json::<serde_json::Value>().await.unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();

        let done = wait_terminal(&client, &srv.base_url, caller, &id).await;
        assert_eq!(done["status"], "completed", "{path}");
    }
}

#[tokio::test]
async fn input_errors_are_rejected_before_a_job_exists() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let caller = Caller::new();

    // Unknown catalog reference
    let res = caller
        .apply(client.post(format!("{}/jobs/scene-photos", srv.base_url)))
        .json(&json!({
            "sceneId": "moon-base",
            "aestheticId": "golden-hour",
            "business": business()
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "scene not found: moon-base");

    // Invalid field
    let res = caller
        .apply(client.post(format!("{}/jobs/character-videos", srv.base_url)))
        .json(&json!({
            "characterId": "friendly-mechanic",
            "script": "",
            "business": business()
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    // Malformed body
    let res = caller
        .apply(client.post(format!("{}/jobs/templated-videos", srv.base_url)))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");

    let res = caller
        .apply(client.get(format!("{}/jobs", srv.base_url)))
        .send()
        .await
        .unwrap();
    let listed: serde_json::Value = res.json().await.unwrap();
    assert!(listed["jobs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn jobs_are_invisible_to_other_tenants() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let owner = Caller::new();
    let stranger = Caller::new();

    let res = owner
        .apply(client.post(format!("{}/jobs/scene-photos", srv.base_url)))
        .json(&json!({
            "sceneId": "front-desk",
            "aestheticId": "studio-clean",
            "business": business()
        }))
        .send()
        .await
        .unwrap();
    let id = res.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = stranger
        .apply(client.get(format!("{}/jobs/{}", srv.base_url, id)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = stranger
        .apply(client.get(format!("{}/jobs", srv.base_url)))
        .send()
        .await
        .unwrap();
    let listed: serde_json::Value = res.json().await.unwrap();
    assert!(listed["jobs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_and_malformed_job_ids() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let caller = Caller::new();

    let res = caller
        .apply(client.get(format!("{}/jobs/{}", srv.base_url, uuid_like())))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = caller
        .apply(client.get(format!("{}/jobs/not-a-job", srv.base_url)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

fn uuid_like() -> String {
    // Any well-formed id that was never issued.
    TenantId::new().to_string()
}

#[tokio::test]
async fn listing_is_newest_first_and_limited() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let caller = Caller::new();

    let mut ids = Vec::new();
    for scene in ["service-bay", "tire-shop", "storefront"] {
        let res = caller
            .apply(client.post(format!("{}/jobs/scene-photos", srv.base_url)))
            .json(&json!({
                "sceneId": scene,
                "aestheticId": "gritty-garage",
                "business": business()
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);
        let id = res.json::<serde_json::Value>().await.unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();
        ids.push(id);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let res = caller
        .apply(client.get(format!("{}/jobs?limit=2", srv.base_url)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listed: serde_json::Value = res.json().await.unwrap();
    let jobs = listed["jobs"].as_array().unwrap();

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["id"], ids[2].as_str());
    assert_eq!(jobs[1]["id"], ids[1].as_str());
}

#[tokio::test]
async fn stats_count_finished_jobs() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let caller = Caller::new();

    let res = caller
        .apply(client.post(format!("{}/jobs/scene-photos", srv.base_url)))
        .json(&json!({
            "sceneId": "service-bay",
            "aestheticId": "golden-hour",
            "business": business()
        }))
        .send()
        .await
        .unwrap();
    let id = res.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    wait_terminal(&client, &srv.base_url, caller, &id).await;

    // The terminal write lands just before the counters are bumped.
    let mut stats = serde_json::Value::Null;
    for _ in 0..50 {
        stats = reqwest::get(format!("{}/stats", srv.base_url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if stats["completed"] == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(stats["submitted"], 1);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["failed"], 0);
}

#[tokio::test]
async fn stats_are_aggregate_counters_only() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(format!("{}/stats", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    let mut keys: Vec<&str> = body
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    assert_eq!(keys, ["completed", "failed", "running", "submitted"]);
    assert!(body.as_object().unwrap().values().all(|v| v.is_u64()));
}
