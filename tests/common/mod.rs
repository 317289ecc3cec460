//! Helpers shared by the integration tests.

#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use httpmock::prelude::*;
// self
use fcm_relay::{
	auth::{ProjectId, ServiceAccountCredential},
	dispatch::PushTarget,
	http::{ReqwestHttpClient, RelayHttpClient},
	relay::{ReqwestRelay, Relay},
	reqwest::Client,
	url::Url,
};

pub const PRIVATE_KEY: &str = include_str!("../fixtures/service_account_key.pem");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/service_account_pub.pem");
pub const CLIENT_EMAIL: &str = "relay@demo-9f30d.iam.gserviceaccount.com";
pub const PROJECT_ID: &str = "demo-9f30d";
pub const PUSH_PATH: &str = "/v1/projects/demo-9f30d/messages:send";

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
/// `httpmock` during tests.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Service account whose token endpoint lives on the mock server.
pub fn credential(server: &MockServer) -> ServiceAccountCredential {
	ServiceAccountCredential::new(CLIENT_EMAIL, PRIVATE_KEY, server.url("/token"))
		.expect("Credential fixture should be valid.")
}

/// Push target rooted at the mock server.
pub fn push_target(server: &MockServer) -> PushTarget {
	let base = Url::parse(&server.base_url()).expect("Mock base URL should parse.");

	PushTarget::with_base(&base, ProjectId::new(PROJECT_ID).expect("Project is valid."))
		.expect("Push target should build.")
}

/// Relay wired to the mock server for both outbound calls.
pub fn build_reqwest_test_relay(server: &MockServer) -> ReqwestRelay {
	Relay::with_http_client(credential(server), push_target(server), test_reqwest_http_client())
}

/// Transport wrapper that counts calls before delegating to reqwest.
#[derive(Clone)]
pub struct CountingHttpClient {
	inner: ReqwestHttpClient,
	calls: Arc<AtomicUsize>,
}
impl CountingHttpClient {
	pub fn new() -> Self {
		Self { inner: test_reqwest_http_client(), calls: Default::default() }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl RelayHttpClient for CountingHttpClient {
	type Handle = <ReqwestHttpClient as RelayHttpClient>::Handle;
	type TransportError = <ReqwestHttpClient as RelayHttpClient>::TransportError;

	fn handle(&self) -> Self::Handle {
		self.calls.fetch_add(1, Ordering::SeqCst);

		self.inner.handle()
	}
}

/// Relay that counts how many outbound calls it attempts.
pub fn build_counting_test_relay(
	server: &MockServer,
) -> (Relay<CountingHttpClient>, CountingHttpClient) {
	let client = CountingHttpClient::new();
	let relay =
		Relay::with_http_client(credential(server), push_target(server), client.clone());

	(relay, client)
}
