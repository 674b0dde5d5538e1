//! HttpBackend against a mock server

use std::sync::Arc;
use std::time::{Duration, Instant};

use option_canvas::api::{
    ApiError, ArtifactMetadata, ArtifactRequest, Backend, CollectionRecord, CreateSessionRequest,
    HttpBackend, RefinementContext, RefinementRequest, accumulate,
};
use option_canvas::session::{Dimension, MockGenerator};
use option_canvas::settings::ApiSettings;
use option_canvas::{Canvas, CanvasError, Settings};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn settings_for(server: &MockServer) -> ApiSettings {
    ApiSettings {
        base_url: format!("{}/api/v1", server.uri()),
        request_timeout_secs: 5,
        ..Default::default()
    }
}

fn refinement_request() -> RefinementRequest {
    RefinementRequest {
        message: "make it bolder".into(),
        mode: "quick".into(),
        session_id: Some("s-42".into()),
        context: RefinementContext {
            route: "refinement".into(),
            card_id: "c-1".into(),
            card_content: "body".into(),
            card_title: "Bold hero".into(),
        },
    }
}

#[tokio::test]
async fn creates_session_with_camel_case_body() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "session": { "id": "s-42", "name": "todo app", "createdAt": "2026-01-01" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&settings_for(&server)).unwrap();
    let info = backend
        .create_session(&CreateSessionRequest {
            name: "todo app".into(),
            project_id: Some("p-1".into()),
            initial_prompt: "build a todo app".into(),
        })
        .await
        .unwrap();
    assert_eq!(info.id, "s-42");

    let request = &server.received_requests().await.unwrap()[0];
    let body = request.body_json::<serde_json::Value>().unwrap();
    assert_eq!(body["projectId"], "p-1");
    assert_eq!(body["initialPrompt"], "build a todo app");
}

#[tokio::test]
async fn session_response_without_session_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": false })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&settings_for(&server)).unwrap();
    let err = backend
        .create_session(&CreateSessionRequest {
            name: "x".into(),
            project_id: None,
            initial_prompt: "x".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MissingField("session")));
}

#[tokio::test]
async fn streams_refinement_chunks() {
    init_logging();
    let server = MockServer::start().await;
    let body = "data: {\"chunk\":\"Hello \"}\n\
                data: not json\n\
                : keepalive\n\
                data: {\"chunk\":\"world\"}\n";
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&settings_for(&server)).unwrap();
    let stream = backend.open_refinement(&refinement_request()).await.unwrap();
    assert_eq!(accumulate(stream).await.unwrap(), "Hello world");

    let request = &server.received_requests().await.unwrap()[0];
    let sent = request.body_json::<serde_json::Value>().unwrap();
    assert_eq!(sent["sessionId"], "s-42");
    assert_eq!(sent["mode"], "quick");
    assert_eq!(sent["context"]["route"], "refinement");
    assert_eq!(sent["context"]["cardId"], "c-1");
}

#[tokio::test]
async fn error_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/stream"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&settings_for(&server)).unwrap();
    let err = match backend.open_refinement(&refinement_request()).await {
        Ok(_) => panic!("expected a status error"),
        Err(e) => e,
    };
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "upstream down");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn artifact_accepts_nested_and_flat_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/agent/artifacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "artifact": { "id": "a-7", "type": "option" }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/agent/artifacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "a-8" })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&settings_for(&server)).unwrap();
    let request = ArtifactRequest {
        name: "Bold hero".into(),
        kind: "option".into(),
        content: "body".into(),
        metadata: ArtifactMetadata {
            dimension: Dimension::Design,
            confidence: 0.9,
            tags: vec!["hero".into()],
            refinements: Vec::new(),
            session_id: Some("s-42".into()),
            collected_at: chrono::Utc::now(),
        },
    };
    assert_eq!(backend.create_artifact(&request).await.unwrap().id, "a-7");
    assert_eq!(backend.create_artifact(&request).await.unwrap().id, "a-8");

    let requests = server.received_requests().await.unwrap();
    let sent = requests[0].body_json::<serde_json::Value>().unwrap();
    assert_eq!(sent["type"], "option");
    assert_eq!(sent["metadata"]["dimension"], "design");
    assert_eq!(sent["metadata"]["sessionId"], "s-42");
    assert!(sent["metadata"]["collectedAt"].is_string());
}

#[tokio::test]
async fn records_collection_against_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/s-42/collect"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&settings_for(&server)).unwrap();
    backend
        .record_collection(
            "s-42",
            &CollectionRecord {
                option_id: "c-1".into(),
                node_id: "a-7".into(),
            },
        )
        .await
        .unwrap();

    let request = &server.received_requests().await.unwrap()[0];
    let sent = request.body_json::<serde_json::Value>().unwrap();
    assert_eq!(sent, json!({ "optionId": "c-1", "nodeId": "a-7" }));
}

#[tokio::test]
async fn canvas_end_to_end_over_http() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "session": { "id": "s-9" } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"chunk\":\"Sharper \"}\ndata: {\"chunk\":\"copy\"}\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/agent/artifacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "artifact": { "id": "a-1" } })))
        .mount(&server)
        .await;
    // Best-effort record fails; collection must still stand
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/s-9/collect"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let settings = Settings {
        api: settings_for(&server),
        ..Default::default()
    };
    let generator = MockGenerator::new(11).with_dimensions(&[Dimension::Technical]);
    let mut canvas = Canvas::with_http(settings, Arc::new(generator)).unwrap();

    let ids = canvas.generate("landing page").await.unwrap();
    assert_eq!(canvas.session().map(|s| s.id.as_str()), Some("s-9"));

    let refined = canvas.refine(ids[0], "tighten the copy").await.unwrap();
    assert_eq!(refined.content, "Sharper copy");

    let artifact = canvas.collect(ids[0]).await.unwrap();
    assert_eq!(artifact.map(|a| a.id), Some("a-1".to_string()));
    assert!(canvas.card(&ids[0]).unwrap().is_collected());
    assert_eq!(canvas.ledger().collected_len(), 1);

    // Unreachable backend: generation still lands, refinement fails cleanly
    let mut broken = Canvas::with_http(
        Settings {
            api: ApiSettings {
                base_url: "http://127.0.0.1:9".into(),
                request_timeout_secs: 2,
                ..Default::default()
            },
            ..Default::default()
        },
        Arc::new(MockGenerator::new(0)),
    )
    .unwrap();
    let ids = broken.generate("x").await.unwrap();
    let refine_err = broken.refine(ids[0], "y").await.unwrap_err();
    assert!(matches!(refine_err, CanvasError::Api(_)));
    assert!(broken.card(&ids[0]).unwrap().refinements().is_empty());
    assert!(!broken.is_processing());
}

#[tokio::test]
async fn slow_refinement_times_out_and_releases_the_permit() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "session": { "id": "s-3" } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data: {\"chunk\":\"late\"}\n", "text/event-stream")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let settings = Settings {
        api: ApiSettings {
            request_timeout_secs: 1,
            ..settings_for(&server)
        },
        ..Default::default()
    };
    let mut canvas = Canvas::with_http(settings, Arc::new(MockGenerator::new(4))).unwrap();
    let ids = canvas.generate("slow backend").await.unwrap();

    let started = Instant::now();
    let err = canvas.refine(ids[0], "expand").await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(matches!(err, CanvasError::Api(_)));
    assert!(!canvas.is_processing());
    assert!(canvas.card(&ids[0]).unwrap().refinements().is_empty());
    assert!(canvas.ledger().decisions().is_empty());

    // The permit is free for the next action
    assert!(canvas.begin_refinement(ids[0], "again").is_ok());
}
