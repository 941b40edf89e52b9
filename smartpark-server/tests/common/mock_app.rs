use std::fs;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use serde_json::Value;
use smartpark_api::models::DeviceRecord;
use smartpark_server::app::AppContext;
use smartpark_server::configs::Settings;
use smartpark_server::devices::DeviceFactory;
use smartpark_server::tests::setup_test_db;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct MockApp {
    pub context: AppContext,
    pub router: Router,
    pub root: TempDir,
}

impl MockApp {
    /// In-memory app with auto mode on and presence sensors that never fire.
    pub async fn new() -> Self {
        let root = tempfile::tempdir().unwrap();

        let mut settings = Settings::default();
        settings.telemetry.root = root.path().to_path_buf();
        settings.automation.enabled = true;

        let factory = DeviceFactory::new(&settings.telemetry).with_presence_chances(0.0, 0.0);
        let context = AppContext::with_storage(setup_test_db().await, &settings, factory);
        let router = context.router();

        Self { context, router, root }
    }

    pub fn write_source(&self, name: &str, content: &str) {
        fs::write(self.root.path().join(name), content).unwrap();
    }

    pub async fn create_device(&self, record: &DeviceRecord) -> DeviceRecord {
        self.context.device_repository.create(record).await.unwrap()
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        let builder = Request::builder().uri(uri).method(method);

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    }
}
