use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use islr_rust::http::{self, AppState, SESSION_HEADER};
use islr_rust::recognition::{Classifier, SignLabelTable, SignRecognizer};
use islr_rust::sentence::SentenceComposer;
use islr_rust::session::SessionStore;
use islr_rust::{AppError, FrameObservation, InferenceTensor, LandmarkKind, LandmarkPoint};
use serde_json::Value;
use tower::ServiceExt;

/// Picks the label whose id is the x of the first right-hand point, or 0 without a right hand.
struct HandCoded;

impl Classifier for HandCoded {
    fn classify(&self, tensor: &InferenceTensor) -> Result<Vec<f32>, AppError> {
        let x = tensor.view()[[0, 522, 0]];
        let winner = if x.is_nan() { 0 } else { x as usize };
        let mut scores = vec![0.0; 4];
        scores[winner] = 1.0;
        Ok(scores)
    }

    fn name(&self) -> &str {
        "hand-coded"
    }
}

struct Sluggish;

impl Classifier for Sluggish {
    fn classify(&self, _tensor: &InferenceTensor) -> Result<Vec<f32>, AppError> {
        std::thread::sleep(Duration::from_millis(200));
        Ok(vec![1.0])
    }

    fn name(&self) -> &str {
        "sluggish"
    }
}

/// Records how many classifications ran at the same time.
#[derive(Default)]
struct Overlap {
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl Classifier for Overlap {
    fn classify(&self, _tensor: &InferenceTensor) -> Result<Vec<f32>, AppError> {
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(vec![1.0])
    }

    fn name(&self) -> &str {
        "overlap"
    }
}

fn app_with(classifier: Arc<dyn Classifier>, timeout: Duration) -> Router {
    let labels = SignLabelTable::from_pairs([(0, "HELLO"), (1, "A"), (2, "B"), (3, "jeans")]);
    let recognizer = SignRecognizer::builder(classifier, labels)
        .timeout(timeout)
        .build();
    let sessions = SessionStore::new("No Movement Detected", Duration::from_secs(60), 16);
    let state = AppState::new(sessions, recognizer, SentenceComposer::joined_only());
    http::router(state, 4 * 1024 * 1024)
}

fn app() -> Router {
    app_with(Arc::new(HandCoded), Duration::from_secs(2))
}

/// Three frames whose right hand encodes `label_id`, or no hand at all.
fn batch(first_frame: i64, secs: f64, label_id: Option<usize>) -> Vec<FrameObservation> {
    (0..3)
        .map(|n| {
            let frame = FrameObservation::empty(first_frame + n, secs + n as f64 * 0.1);
            match label_id {
                Some(id) => frame.with_group(
                    LandmarkKind::RightHand,
                    vec![LandmarkPoint::new(id as f32, 0.5, 0.0); 21],
                ),
                None => frame,
            }
        })
        .collect()
}

fn predict(session: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/predict-sequence")
        .header("content-type", "application/json");
    if let Some(session) = session {
        builder = builder.header(SESSION_HEADER, session);
    }
    builder.body(Body::from(body)).unwrap()
}

fn predict_frames(session: Option<&str>, frames: &[FrameObservation]) -> Request<Body> {
    predict(session, serde_json::to_vec(frames).unwrap())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn session_count(app: &Router) -> u64 {
    let (_, body) = send(
        app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    body["sessions"].as_u64().unwrap()
}

async fn batches_of(app: &Router, session: &str) -> u64 {
    let (_, body) = send(
        app,
        Request::builder()
            .uri(format!("/sessions/{}", session))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    body["batches"].as_u64().unwrap()
}

async fn new_session(app: &Router) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/sessions")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn hello_appears_once_after_two_batches() {
    let app = app();
    let session = new_session(&app).await;

    let (status, _) = send(&app, predict_frames(Some(&session), &batch(0, 5.0, None))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, predict_frames(Some(&session), &batch(3, 6.0, None))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["sign"], "HELLO");
    assert_eq!(body["list_sign"], serde_json::json!(["HELLO"]));
    assert_eq!(body["sentence"], "");
}

#[tokio::test]
async fn signs_accumulate_into_a_sentence_and_reset_on_restart() {
    let app = app();
    let session = new_session(&app).await;

    send(&app, predict_frames(Some(&session), &batch(0, 5.0, Some(1)))).await;
    let (_, body) = send(&app, predict_frames(Some(&session), &batch(3, 6.0, Some(2)))).await;
    assert_eq!(body["list_sign"], serde_json::json!(["A", "B"]));
    assert_eq!(body["sentence"], "A B");

    let (_, body) = send(&app, predict_frames(Some(&session), &batch(0, 0.0, Some(2)))).await;
    assert_eq!(body["list_sign"], serde_json::json!(["B"]));
    assert_eq!(body["sentence"], "");
}

#[tokio::test]
async fn noise_label_clears_the_session() {
    let app = app();
    let session = new_session(&app).await;

    send(&app, predict_frames(Some(&session), &batch(0, 5.0, Some(1)))).await;
    let (_, body) = send(&app, predict_frames(Some(&session), &batch(3, 6.0, Some(3)))).await;
    assert_eq!(body["sign"], "No Movement Detected");
    assert_eq!(body["list_sign"], serde_json::json!([]));
}

#[tokio::test]
async fn sessions_are_isolated() {
    let app = app();
    let first = new_session(&app).await;
    let second = new_session(&app).await;

    send(&app, predict_frames(Some(&first), &batch(0, 5.0, Some(1)))).await;
    send(&app, predict_frames(Some(&second), &batch(0, 5.0, Some(2)))).await;
    let (_, body) = send(&app, predict_frames(Some(&first), &batch(3, 6.0, Some(1)))).await;
    assert_eq!(body["list_sign"], serde_json::json!(["A"]));

    let (_, body) = send(
        &app,
        Request::builder()
            .uri(format!("/sessions/{}", second))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(body["list_sign"], serde_json::json!(["B"]));
    assert_eq!(body["batches"], 1);
}

#[tokio::test]
async fn missing_header_creates_a_session() {
    let app = app();
    let response = app
        .clone()
        .oneshot(predict_frames(None, &batch(0, 5.0, Some(1))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get(SESSION_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["session_id"], header);

    let (_, body) = send(&app, predict_frames(Some(&header), &batch(3, 6.0, Some(2)))).await;
    assert_eq!(body["sentence"], "A B");
}

#[tokio::test]
async fn unknown_and_malformed_sessions_are_rejected() {
    let app = app();
    let frames = batch(0, 5.0, None);
    let (status, body) = send(
        &app,
        predict_frames(Some("6a0b1c2d-0000-4000-8000-000000000000"), &frames),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);

    let (status, _) = send(&app, predict_frames(Some("not-a-uuid"), &frames)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() {
    let app = app();
    let session = new_session(&app).await;

    let (status, body) = send(
        &app,
        predict(Some(&session), br#"[{"timeInSeconds": 5.0}]"#.to_vec()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("frameNumber"));

    let (status, _) = send(&app, predict(Some(&session), b"[]".to_vec())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut frames = batch(0, 5.0, None);
    frames[0].left_hand_landmarks = Some(vec![LandmarkPoint::new(0.0, 0.0, 0.0); 25]);
    let (status, body) = send(&app, predict_frames(Some(&session), &frames)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("left_hand"));
}

#[tokio::test]
async fn duplicate_frames_are_a_shape_error() {
    let app = app();
    let session = new_session(&app).await;
    let mut frames = batch(0, 5.0, None);
    frames[2].frame_number = 0;
    let (status, body) = send(&app, predict_frames(Some(&session), &frames)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);
}

#[tokio::test]
async fn slow_inference_is_a_timeout() {
    let app = app_with(Arc::new(Sluggish), Duration::from_millis(20));
    let session = new_session(&app).await;
    let (status, body) = send(&app, predict_frames(Some(&session), &batch(0, 5.0, None))).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn sentence_falls_back_to_joined_words() {
    let app = app();
    let session = new_session(&app).await;
    send(&app, predict_frames(Some(&session), &batch(0, 5.0, Some(1)))).await;
    send(&app, predict_frames(Some(&session), &batch(3, 6.0, Some(2)))).await;

    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri(format!("/sessions/{}/sentence", session))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentence"], "A B");
    assert_eq!(body["source"], "joined");
}

#[tokio::test]
async fn deleted_sessions_are_gone() {
    let app = app();
    let session = new_session(&app).await;
    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/sessions/{}", session))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, predict_frames(Some(&session), &batch(0, 5.0, None))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_model_and_sessions() {
    let app = app();
    new_session(&app).await;
    let (status, body) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "hand-coded");
    assert_eq!(body["labels"], 4);
    assert_eq!(body["sessions"], 1);
    assert_eq!(body["sentence_smoother"], false);
}

#[tokio::test]
async fn rejected_batches_without_header_leave_no_session() {
    let app = app();
    for _ in 0..20 {
        let (status, _) = send(&app, predict(None, b"[]".to_vec())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let mut frames = batch(0, 5.0, None);
    frames[2].frame_number = 0;
    let (status, _) = send(&app, predict_frames(None, &frames)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(session_count(&app).await, 0);

    let (status, _) = send(&app, predict_frames(None, &batch(0, 5.0, Some(1)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session_count(&app).await, 1);
}

#[tokio::test]
async fn rejected_batches_are_not_counted() {
    let app = app();
    let session = new_session(&app).await;
    send(&app, predict_frames(Some(&session), &batch(0, 5.0, Some(1)))).await;

    let mut frames = batch(3, 6.0, None);
    frames[1].frame_number = 3;
    let (status, _) = send(&app, predict_frames(Some(&session), &frames)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(batches_of(&app, &session).await, 1);
    assert_eq!(session_count(&app).await, 1);
}

#[tokio::test]
async fn concurrent_batches_on_one_session_run_in_turn() {
    let overlap = Arc::new(Overlap::default());
    let app = app_with(overlap.clone(), Duration::from_secs(2));
    let session = new_session(&app).await;

    let (first, second) = tokio::join!(
        send(&app, predict_frames(Some(&session), &batch(0, 5.0, None))),
        send(&app, predict_frames(Some(&session), &batch(3, 6.0, None))),
    );
    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);
    assert_eq!(overlap.peak.load(Ordering::SeqCst), 1);
    assert_eq!(batches_of(&app, &session).await, 2);
}
