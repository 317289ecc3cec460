//! Per-request orchestration: sign, exchange, then dispatch.
//!
//! [`Relay::send_notification`] is stateless across calls. Each call reads the clock once,
//! signs a fresh assertion, exchanges it for a new access token, and only after that exchange
//! succeeds posts the message. Access tokens are never cached, so two identical notifications
//! produce two independent assertions and two token exchanges.

// self
use crate::{
	_prelude::*,
	assertion::{self, JwtAssertion},
	auth::{AccessToken, ServiceAccountCredential},
	clock::{Clock, SystemClock},
	dispatch::{self, PushTarget},
	exchange,
	http::RelayHttpClient,
	notification::NotificationRequest,
	obs::{self, FlowSpan, Outcome, Stage},
};
#[cfg(feature = "reqwest")]
use crate::{config::DEFAULT_HTTP_TIMEOUT, error::ConfigError, http::ReqwestHttpClient};

#[cfg(feature = "reqwest")]
/// Relay specialized for the crate's default reqwest transport.
pub type ReqwestRelay = Relay<ReqwestHttpClient>;

/// Sends notifications on behalf of one service account and one push project.
///
/// Every field is read-only after construction, so a single `Relay` (usually behind an `Arc`)
/// serves any number of concurrent requests without locking.
pub struct Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	/// HTTP client used for both outbound calls.
	pub http_client: Arc<C>,
	/// Service account that signs every assertion.
	pub credential: Arc<ServiceAccountCredential>,
	/// Push endpoint messages are posted to.
	pub target: PushTarget,
	clock: Arc<dyn Clock>,
}
impl<C> Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	/// Creates a relay that reuses the caller-provided transport.
	pub fn with_http_client(
		credential: impl Into<Arc<ServiceAccountCredential>>,
		target: PushTarget,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			credential: credential.into(),
			target,
			clock: Arc::new(SystemClock),
		}
	}

	/// Replaces the wall clock used to stamp assertions.
	pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
		self.clock = Arc::new(clock);

		self
	}

	/// Signs a fresh assertion at the current clock reading.
	pub fn assertion(&self) -> Result<JwtAssertion> {
		let now = self.clock.now();

		obs::record_outcome(Stage::Assertion, Outcome::Attempt);

		obs::observe(Stage::Assertion, assertion::build_assertion(&self.credential, now))
			.map_err(Error::from)
	}

	/// Signs an assertion and exchanges it for an access token.
	pub async fn access_token(&self) -> Result<AccessToken> {
		let assertion = self.assertion()?;

		obs::record_outcome(Stage::TokenExchange, Outcome::Attempt);

		let token = FlowSpan::new(Stage::TokenExchange)
			.instrument(exchange::exchange_assertion(
				self.http_client.as_ref(),
				self.credential.token_uri(),
				&assertion,
			))
			.await;

		obs::observe(Stage::TokenExchange, token).map_err(Error::from)
	}

	/// Delivers `request`, exchanging credentials first.
	///
	/// Fails fast: a signing or exchange failure means the push endpoint is never contacted,
	/// and a delivery failure after a successful exchange is still a failure of the whole call.
	pub async fn send_notification(&self, request: &NotificationRequest) -> Result<()> {
		const STAGE: Stage = Stage::Notification;

		let span = FlowSpan::new(STAGE);

		obs::record_outcome(STAGE, Outcome::Attempt);

		let result = span
			.instrument(async move {
				let token = self.access_token().await?;

				obs::record_outcome(Stage::Dispatch, Outcome::Attempt);

				let delivered = FlowSpan::new(Stage::Dispatch)
					.instrument(dispatch::dispatch(
						self.http_client.as_ref(),
						&self.target,
						request,
						&token,
					))
					.await;

				obs::observe(Stage::Dispatch, delivered).map_err(Error::from)
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(STAGE, Outcome::Success),
			Err(_) => obs::record_outcome(STAGE, Outcome::Failure),
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl Relay<ReqwestHttpClient> {
	/// Creates a relay backed by a reqwest client that gives up after [`DEFAULT_HTTP_TIMEOUT`].
	pub fn new(
		credential: impl Into<Arc<ServiceAccountCredential>>,
		target: PushTarget,
	) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::with_timeout(DEFAULT_HTTP_TIMEOUT)?;

		Ok(Self::with_http_client(credential, target, http_client))
	}
}
impl<C> Clone for Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			credential: self.credential.clone(),
			target: self.target.clone(),
			clock: self.clock.clone(),
		}
	}
}
impl<C> Debug for Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay")
			.field("credential", &self.credential)
			.field("target", &self.target)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::{
		Mutex,
		atomic::{AtomicI64, Ordering},
	};
	// crates.io
	use oauth2::{
		AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
		http::{Response, StatusCode},
	};
	// self
	use super::*;
	use crate::{
		assertion::ClaimSet,
		auth::ProjectId,
		error::{DeliveryError, TokenExchangeError},
	};

	#[derive(Debug)]
	struct Never;
	impl Display for Never {
		fn fmt(&self, f: &mut Formatter) -> FmtResult {
			f.write_str("never")
		}
	}
	impl StdError for Never {}

	/// Answers the token endpoint and the push endpoint with fixed statuses and records every
	/// request URI in call order.
	#[derive(Clone)]
	struct ScriptedClient {
		token_status: u16,
		push_status: u16,
		calls: Arc<Mutex<Vec<String>>>,
	}
	impl ScriptedClient {
		fn new(token_status: u16, push_status: u16) -> Self {
			Self { token_status, push_status, calls: Default::default() }
		}

		fn calls(&self) -> Vec<String> {
			self.calls.lock().expect("Call log lock should not be poisoned.").clone()
		}
	}
	impl RelayHttpClient for ScriptedClient {
		type Handle = ScriptedClient;
		type TransportError = Never;

		fn handle(&self) -> Self::Handle {
			self.clone()
		}
	}
	impl<'c> AsyncHttpClient<'c> for ScriptedClient {
		type Error = HttpClientError<Never>;
		type Future =
			Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

		fn call(&'c self, request: HttpRequest) -> Self::Future {
			let uri = request.uri().to_string();

			self.calls.lock().expect("Call log lock should not be poisoned.").push(uri.clone());

			let (status, body) = if uri.contains("/token") {
				(self.token_status, r#"{"access_token":"tok1","expires_in":3599}"#)
			} else {
				(self.push_status, r#"{"name":"projects/demo/messages/1"}"#)
			};

			Box::pin(async move {
				let mut response = Response::new(body.as_bytes().to_vec());

				*response.status_mut() =
					StatusCode::from_u16(status).expect("Scripted status should be valid.");

				Ok(response)
			})
		}
	}

	/// Advances one second per reading.
	struct SteppingClock(AtomicI64);
	impl Clock for SteppingClock {
		fn now(&self) -> OffsetDateTime {
			let secs = self.0.fetch_add(1, Ordering::SeqCst);

			OffsetDateTime::from_unix_timestamp(secs).expect("Stepping clock stays in range.")
		}
	}

	fn relay(client: ScriptedClient) -> Relay<ScriptedClient> {
		let credential = ServiceAccountCredential::new(
			"relay@demo-9f30d.iam.gserviceaccount.com",
			include_str!("../tests/fixtures/service_account_key.pem"),
			"https://oauth2.example.com/token",
		)
		.expect("Credential fixture should be valid.");
		let target = PushTarget::fcm(ProjectId::new("demo-9f30d").expect("Project is valid."))
			.expect("Target should build.");

		Relay::with_http_client(credential, target, client)
			.with_clock(SteppingClock(AtomicI64::new(1_800_000_000)))
	}

	fn request() -> NotificationRequest {
		NotificationRequest::new("Hi", "There", "abc123").expect("Request should validate.")
	}

	#[tokio::test]
	async fn exchange_happens_before_dispatch() {
		let client = ScriptedClient::new(200, 200);

		relay(client.clone())
			.send_notification(&request())
			.await
			.expect("Scripted flow should succeed.");

		let calls = client.calls();

		assert_eq!(calls.len(), 2);
		assert!(calls[0].starts_with("https://oauth2.example.com/token?grant_type="));
		assert_eq!(
			calls[1],
			"https://fcm.googleapis.com/v1/projects/demo-9f30d/messages:send"
		);
	}

	#[tokio::test]
	async fn rejected_exchange_never_dispatches() {
		let client = ScriptedClient::new(401, 200);
		let err = relay(client.clone())
			.send_notification(&request())
			.await
			.expect_err("Rejected exchange should fail the call.");

		assert!(matches!(
			err,
			Error::TokenExchange(TokenExchangeError::Rejected { status: 401, .. })
		));
		assert_eq!(client.calls().len(), 1);
	}

	#[tokio::test]
	async fn failed_delivery_is_a_full_failure() {
		let client = ScriptedClient::new(200, 503);
		let err = relay(client.clone())
			.send_notification(&request())
			.await
			.expect_err("Rejected delivery should fail the call.");

		assert!(matches!(err, Error::Delivery(DeliveryError::Rejected { status: 503, .. })));
		assert_eq!(client.calls().len(), 2);
	}

	#[tokio::test]
	async fn every_call_signs_a_fresh_assertion() {
		let client = ScriptedClient::new(200, 200);
		let relay = relay(client.clone());

		relay.send_notification(&request()).await.expect("First call should succeed.");
		relay.send_notification(&request()).await.expect("Second call should succeed.");

		let assertions = client
			.calls()
			.into_iter()
			.filter(|uri| uri.contains("/token"))
			.map(|uri| {
				let url = Url::parse(&uri).expect("Token URI should parse.");

				url.query_pairs()
					.find(|(name, _)| name == "assertion")
					.map(|(_, value)| value.into_owned())
					.expect("Token request should carry an assertion.")
			})
			.collect::<Vec<_>>();

		assert_eq!(assertions.len(), 2, "Tokens must not be cached between calls.");
		assert_ne!(assertions[0], assertions[1]);

		let claims = assertions
			.iter()
			.map(|token| {
				let segment = token.split('.').nth(1).expect("Assertion has a claims segment.");

				assertion::decode_segment::<ClaimSet>(segment).expect("Claims should decode.")
			})
			.collect::<Vec<_>>();

		assert_ne!(claims[0].iat, claims[1].iat);
		assert_ne!(claims[0].exp, claims[1].exp);
		assert!(claims.iter().all(|claims| claims.exp - claims.iat == 3600));
	}
}
