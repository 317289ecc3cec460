mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::*;
use fcm_relay::{
	auth::{AccessToken, ProjectId},
	dispatch::{self, PushTarget},
	error::DeliveryError,
	notification::NotificationRequest,
	url::Url,
};

fn request() -> NotificationRequest {
	NotificationRequest::new("Hi", "There", "abc123").expect("Request fixture should validate.")
}

#[tokio::test]
async fn dispatch_posts_authorized_envelope() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(PUSH_PATH)
				.header("authorization", "Bearer tok1")
				.header("content-type", "application/json")
				.json_body(json!({
					"message": {
						"token": "abc123",
						"notification": { "title": "Hi", "body": "There" },
					},
				}));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"name\":\"projects/demo-9f30d/messages/0:1\"}");
		})
		.await;

	dispatch::dispatch(
		&test_reqwest_http_client(),
		&push_target(&server),
		&request(),
		&AccessToken::new("tok1"),
	)
	.await
	.expect("Dispatch should succeed.");

	mock.assert_async().await;
}

#[tokio::test]
async fn dispatch_maps_provider_errors() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(PUSH_PATH);
			then.status(404).header("content-type", "application/json").json_body(json!({
				"error": {
					"code": 404,
					"message": "Requested entity was not found.",
					"status": "NOT_FOUND",
				},
			}));
		})
		.await;
	let err = dispatch::dispatch(
		&test_reqwest_http_client(),
		&push_target(&server),
		&request(),
		&AccessToken::new("tok1"),
	)
	.await
	.expect_err("Unknown registration token should fail.");

	match err {
		DeliveryError::Rejected { status, body } => {
			assert_eq!(status, 404);
			assert!(body.contains("NOT_FOUND"));
		},
		other => panic!("Unexpected error: {other:?}"),
	}

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn dispatch_reports_unreachable_provider() {
	let base = Url::parse("http://127.0.0.1:1").expect("Closed port URL should parse.");
	let project_id = ProjectId::new(PROJECT_ID).expect("Project is valid.");
	let target = PushTarget::with_base(&base, project_id).expect("Push target should build.");
	let err = dispatch::dispatch(
		&test_reqwest_http_client(),
		&target,
		&request(),
		&AccessToken::new("tok1"),
	)
	.await
	.expect_err("Closed port should fail.");

	assert!(matches!(err, DeliveryError::Transport(_)));
}
