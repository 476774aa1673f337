//! Integration tests for the export/publish/update pipeline (card-studio).
//!
//! Runs the pipeline against a mock persistence API, with images served
//! over HTTP or read from a temporary asset directory.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use card_core::{
    DesignElement, ElementKind, ImageContent, ImageStyle, Notifier, RecordingNotifier, Transform,
};
use card_renderer::{ImageResolver, SvgStage};
use card_studio::{
    CommunityDesign, EditorSession, ExportPipeline, HttpDesignApi, HttpImageLoader,
    PublishRequest, StudioConfig, StudioError,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn tiny_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([20, 120, 220, 255]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

fn image_element(id: &str, src: &str) -> DesignElement {
    DesignElement::new(ElementKind::Image {
        content: ImageContent {
            src: src.to_string(),
        },
        style: ImageStyle { border_radius: 0.0 },
    })
    .with_id(id)
    .with_transform(Transform {
        x: 40.0,
        y: 40.0,
        width: 200.0,
        height: 120.0,
        rotation: 0.0,
        opacity: 1.0,
        z_index: 1,
    })
}

fn config(server: &MockServer, output_dir: &Path, asset_root: &Path) -> StudioConfig {
    StudioConfig {
        api_base_url: server.uri(),
        auth_token: Some("secret".into()),
        output_dir: output_dir.to_path_buf(),
        asset_root: asset_root.to_path_buf(),
        settle_delay_ms: 0,
        ..StudioConfig::new()
    }
}

fn pipeline(config: &StudioConfig) -> ExportPipeline {
    let loader = HttpImageLoader::new(&config.asset_root).expect("loader");
    let resolver = ImageResolver::with_timeout(Arc::new(loader), config.image_timeout());
    let api = HttpDesignApi::new(&config.api_base_url, config.auth_token.clone()).expect("api");
    ExportPipeline::new(config.clone(), resolver, Arc::new(api))
}

fn session(notifier: &Arc<RecordingNotifier>) -> EditorSession<SvgStage> {
    let notifier: Arc<dyn Notifier> = notifier.clone();
    EditorSession::new(SvgStage::new(1.0, 1.0), notifier, 50)
}

fn first_src(session: &EditorSession<SvgStage>) -> String {
    session.store().elements()[0]
        .kind
        .image_src()
        .expect("image element")
        .to_string()
}

async fn recorded_body(server: &MockServer, endpoint: &str) -> Value {
    let requests = server.received_requests().await.expect("recording enabled");
    let request = requests
        .iter()
        .find(|r| r.url.path() == endpoint)
        .expect("request sent");
    serde_json::from_slice(&request.body).expect("json body")
}

// ============================================================================
// Export
// ============================================================================

#[tokio::test]
async fn test_export_embeds_remote_image_and_writes_png() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/rings.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(tiny_png()))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().expect("tempdir");
    let config = config(&server, &out.path().join("exports"), out.path());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = session(&notifier);

    let remote = format!("{}/media/rings.png", server.uri());
    session
        .store_mut()
        .set_elements_with_history(vec![image_element("img", &remote)]);
    session.render();

    let written = pipeline.export(&mut session).await.expect("export");

    let name = written
        .file_name()
        .and_then(|n| n.to_str())
        .expect("file name");
    assert!(name.starts_with("vibescard-"));
    assert!(name.ends_with(".png"));
    let bytes = std::fs::read(&written).expect("read export");
    assert_eq!(&bytes[..4], b"\x89PNG");

    assert!(first_src(&session).starts_with("data:image/png;base64,"));
    assert_eq!(
        notifier.titles(),
        vec!["Preparing Export", "Export Success"]
    );

    // Embedding is an ordinary history entry.
    assert!(session.undo());
    assert_eq!(first_src(&session), remote);
}

#[tokio::test]
async fn test_export_falls_back_to_stripped_asset_path() {
    let server = MockServer::start().await;
    let assets = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(assets.path().join("images")).expect("mkdir");
    std::fs::write(assets.path().join("images/logo.png"), tiny_png()).expect("write");

    let config = config(&server, assets.path(), assets.path());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = session(&notifier);
    session
        .store_mut()
        .set_elements_with_history(vec![image_element("logo", "/src/images/logo.png")]);

    pipeline.export(&mut session).await.expect("export");

    assert!(first_src(&session).starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_unreachable_image_keeps_original_source() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().expect("tempdir");
    let config = config(&server, out.path(), out.path());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = session(&notifier);

    let missing = format!("{}/media/missing.png", server.uri());
    session
        .store_mut()
        .set_elements_with_history(vec![image_element("gone", &missing)]);

    pipeline.export(&mut session).await.expect("export");

    assert_eq!(first_src(&session), missing);
    assert!(notifier.titles().contains(&"Export Success".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_prepare_waits_for_settle_delay() {
    let config = StudioConfig {
        settle_delay_ms: 500,
        ..StudioConfig::new()
    };
    let loader = HttpImageLoader::new(".").expect("loader");
    let resolver = ImageResolver::new(Arc::new(loader));
    let api = HttpDesignApi::new(&config.api_base_url, None).expect("api");
    let pipeline = ExportPipeline::new(config.clone(), resolver, Arc::new(api));
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = session(&notifier);

    let started = tokio::time::Instant::now();
    let raster = pipeline.prepare(&mut session).await.expect("prepare");

    assert!(started.elapsed() >= config.settle_delay());
    assert!(raster.data_uri().starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_json_export_names_file_by_timestamp() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().expect("tempdir");
    let config = config(&server, out.path(), out.path());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let session = session(&notifier);

    let written = pipeline.export_json(&session).await.expect("export json");

    let name = written
        .file_name()
        .and_then(|n| n.to_str())
        .expect("file name");
    assert!(name.starts_with("vibescard-design-"));
    let value: Value =
        serde_json::from_str(&std::fs::read_to_string(&written).expect("read")).expect("json");
    assert!(value["elements"].is_array());
    assert!(value["exportedAt"].is_string());
}

// ============================================================================
// Publish
// ============================================================================

#[tokio::test]
async fn test_publish_creates_design_and_maps_tab() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/master/community-designs/create"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "community_designs_id": 42 },
            "message": "created"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/master/design-tabs-map/create"))
        .and(body_partial_json(json!({
            "tabs_id": 2,
            "community_designs_id": 42,
            "status": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
        .expect(1)
        .mount(&server)
        .await;

    let out = tempfile::tempdir().expect("tempdir");
    let config = config(&server, out.path(), out.path());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = session(&notifier);

    let request = PublishRequest {
        title: Some("Garden Party".into()),
        sub_title: None,
        tags: "summer, garden ,".into(),
    };
    let outcome = pipeline
        .publish(&mut session, &request)
        .await
        .expect("publish");

    assert_eq!(outcome.community_designs_id, 42);
    assert!(outcome.tab_mapping.is_ok());

    let body = recorded_body(&server, "/api/master/community-designs/create").await;
    assert_eq!(body["title"], "Garden Party");
    assert_eq!(body["sub_title"], session.details().message.as_str());
    assert_eq!(body["categories_id"], 1);
    assert_eq!(body["image_type"], "Beginner");
    assert_eq!(body["image_sell_type"], "free");
    assert_eq!(body["hash_tag"], json!(["summer", "garden"]));
    assert_eq!(body["status"], true);
    assert!(body["image"]
        .as_str()
        .expect("image")
        .starts_with("data:image/png;base64,"));
    let scene: Value =
        serde_json::from_str(body["design_json_data"].as_str().expect("scene")).expect("json");
    assert!(scene.is_object());

    assert_eq!(
        notifier.titles(),
        vec!["Preparing Design", "Design Published"]
    );
}

#[tokio::test]
async fn test_publish_embedding_is_undoable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/venue.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(tiny_png()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/master/community-designs/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "community_designs_id": 3 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/master/design-tabs-map/create"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().expect("tempdir");
    let config = config(&server, out.path(), out.path());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = session(&notifier);

    let remote = format!("{}/media/venue.png", server.uri());
    session
        .store_mut()
        .set_elements_with_history(vec![image_element("venue", &remote)]);

    pipeline
        .publish(&mut session, &PublishRequest::default())
        .await
        .expect("publish");

    assert!(first_src(&session).starts_with("data:"));
    assert!(session.undo());
    assert_eq!(first_src(&session), remote);
}

#[tokio::test]
async fn test_publish_honours_base_url_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/api/master/community-designs/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "community_designs_id": 11 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/api/master/design-tabs-map/create"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let out = tempfile::tempdir().expect("tempdir");
    let mut config = config(&server, out.path(), out.path());
    config.api_base_url = format!("{}/v2", server.uri());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = session(&notifier);

    let outcome = pipeline
        .publish(&mut session, &PublishRequest::default())
        .await
        .expect("publish");

    assert_eq!(outcome.community_designs_id, 11);
    assert!(outcome.tab_mapping.is_ok());
}

#[tokio::test]
async fn test_tab_mapping_failure_does_not_fail_publish() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/master/community-designs/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "community_designs_id": 7 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/master/design-tabs-map/create"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().expect("tempdir");
    let config = config(&server, out.path(), out.path());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = session(&notifier);

    let outcome = pipeline
        .publish(&mut session, &PublishRequest::default())
        .await
        .expect("publish still succeeds");

    assert_eq!(outcome.community_designs_id, 7);
    assert!(matches!(
        outcome.tab_mapping,
        Err(StudioError::Api { status: 500, .. })
    ));
    let notifications = notifier.notifications();
    let mapping = notifications
        .iter()
        .find(|n| n.title == "Mapping Failed")
        .expect("mapping notification");
    assert!(mapping.is_destructive());
}

#[tokio::test]
async fn test_create_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/master/community-designs/create"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad payload"))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().expect("tempdir");
    let config = config(&server, out.path(), out.path());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let mut session = session(&notifier);

    let result = pipeline
        .publish(&mut session, &PublishRequest::default())
        .await;

    assert!(matches!(result, Err(StudioError::Api { status: 422, .. })));
    assert_eq!(
        notifier.titles(),
        vec!["Preparing Design", "Publish Failed"]
    );
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests
        .iter()
        .all(|r| r.url.path() != "/api/master/design-tabs-map/create"));
}

// ============================================================================
// Update
// ============================================================================

fn stored_design() -> CommunityDesign {
    CommunityDesign {
        community_designs_id: Some(31),
        categories_id: json!(5),
        image: "https://cdn.test/cover.png".into(),
        title: "Spring Gala".into(),
        sub_title: Some("Dress to impress".into()),
        image_type: Some("Advanced".into()),
        image_sell_type: Some(String::new()),
        hash_tag: Some(vec!["gala".into()]),
        status: Some(false),
        design_json_data: None,
    }
}

#[tokio::test]
async fn test_update_keeps_stored_cover_image() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(
            "/api/master/community-designs/updateCommunityDesignById",
        ))
        .and(body_partial_json(json!({
            "id": 31,
            "image": "https://cdn.test/cover.png",
            "categories_id": 5,
            "title": "Spring Gala",
            "image_type": "Advanced",
            "image_sell_type": "free",
            "hash_tag": ["gala"],
            "status": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let out = tempfile::tempdir().expect("tempdir");
    let config = config(&server, out.path(), out.path());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let dyn_notifier: Arc<dyn Notifier> = notifier.clone();
    let session =
        EditorSession::open(SvgStage::new(1.0, 1.0), dyn_notifier, 50, stored_design());

    pipeline.update(&session, "").await.expect("update");

    assert_eq!(notifier.titles(), vec!["Design Updated"]);
}

#[tokio::test]
async fn test_update_tags_replace_stored_tags() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(
            "/api/master/community-designs/updateCommunityDesignById",
        ))
        .and(body_partial_json(json!({ "hash_tag": ["spring", "formal"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let out = tempfile::tempdir().expect("tempdir");
    let config = config(&server, out.path(), out.path());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let dyn_notifier: Arc<dyn Notifier> = notifier.clone();
    let session =
        EditorSession::open(SvgStage::new(1.0, 1.0), dyn_notifier, 50, stored_design());

    pipeline
        .update(&session, "spring, formal")
        .await
        .expect("update");
}

#[tokio::test]
async fn test_update_without_design_id_sends_nothing() {
    let server = MockServer::start().await;
    let out = tempfile::tempdir().expect("tempdir");
    let config = config(&server, out.path(), out.path());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let session = session(&notifier);

    let result = pipeline.update(&session, "").await;

    assert!(matches!(result, Err(StudioError::NoInitialDesign)));
    assert_eq!(notifier.titles(), vec!["Update Error"]);
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_update_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().expect("tempdir");
    let config = config(&server, out.path(), out.path());
    let pipeline = pipeline(&config);
    let notifier = Arc::new(RecordingNotifier::new());
    let dyn_notifier: Arc<dyn Notifier> = notifier.clone();
    let session =
        EditorSession::open(SvgStage::new(1.0, 1.0), dyn_notifier, 50, stored_design());

    let result = pipeline.update(&session, "").await;

    assert!(matches!(result, Err(StudioError::Api { status: 503, .. })));
    assert_eq!(notifier.titles(), vec!["Update Failed"]);
}
