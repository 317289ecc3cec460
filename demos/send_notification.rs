//! Demonstrates one full relay round trip against mocked identity and push endpoints.
//!
//! The service account JSON is built in memory exactly as it would be read from
//! `FCM_SERVICE_ACCOUNT`; both outbound calls land on a local `httpmock` server.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use fcm_relay::{
	auth::ServiceAccountCredential,
	dispatch::PushTarget,
	http::ReqwestHttpClient,
	notification::NotificationRequest,
	relay::Relay,
	reqwest::Client,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").query_param_exists("assertion");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":3599}",
			);
		})
		.await;
	let push_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/projects/demo-9f30d/messages:send")
				.header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"name\":\"projects/demo-9f30d/messages/0:1\"}");
		})
		.await;
	let service_account = json!({
		"type": "service_account",
		"project_id": "demo-9f30d",
		"client_email": "relay@demo-9f30d.iam.gserviceaccount.com",
		"private_key": include_str!("../tests/fixtures/service_account_key.pem"),
		"token_uri": server.url("/token"),
	})
	.to_string();
	let credential = ServiceAccountCredential::from_json(&service_account)?;
	let project_id = credential.project_id().cloned().ok_or_else(|| {
		color_eyre::eyre::eyre!("Service account JSON should carry a project_id.")
	})?;
	let target = PushTarget::with_base(&Url::parse(&server.base_url())?, project_id)?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let relay = Arc::new(Relay::with_http_client(credential, target, http_client));
	let request =
		NotificationRequest::new("Deploy finished", "Build 1042 is live.", "device-abc123")?;

	relay.send_notification(&request).await?;

	println!("Delivered to {}.", relay.target.endpoint());

	token_mock.assert_async().await;
	push_mock.assert_async().await;

	Ok(())
}
