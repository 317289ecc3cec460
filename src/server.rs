//! HTTP surface: `POST /api/sendNotification` behind a permissive CORS layer.

// std
use std::net::{Ipv4Addr, SocketAddr};
// crates.io
use axum::{
	Json, Router,
	body::Bytes,
	extract::State,
	http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
	response::{IntoResponse, Response},
	routing::post,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
// self
use crate::{
	_prelude::*,
	config::AppConfig,
	http::{ReqwestHttpClient, RelayHttpClient},
	notification::NotificationDraft,
	relay::Relay,
};

/// Route the relay answers on.
pub const SEND_NOTIFICATION_PATH: &str = "/api/sendNotification";

const MSG_SENT: &str = "Notification sent successfully!";
const MSG_MISSING_FIELDS: &str = "Missing title, body, or token";
const MSG_INVALID_BODY: &str = "Invalid request body";
const MSG_SEND_FAILED: &str = "Error sending notification";

/// JSON body of every response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
	/// Human-readable outcome.
	pub message: String,
	/// Diagnostic detail, present on failures.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}
impl ApiResponse {
	fn reply(status: StatusCode, message: &str, error: Option<String>) -> Response {
		(status, Json(Self { message: message.to_owned(), error })).into_response()
	}
}

/// Builds the router around a shared relay.
pub fn router<C>(relay: Arc<Relay<C>>) -> Router
where
	C: ?Sized + RelayHttpClient,
{
	Router::new()
		.route(SEND_NOTIFICATION_PATH, post(send_notification::<C>))
		.layer(CorsLayer::permissive())
		.with_state(relay)
}

/// Binds `0.0.0.0:<port>` and serves until Ctrl-C.
pub async fn serve(config: AppConfig) -> Result<()> {
	let http_client = ReqwestHttpClient::with_timeout(config.http_timeout)?;
	let relay = Arc::new(Relay::with_http_client(
		config.credential.clone(),
		config.target.clone(),
		http_client,
	));
	let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port))).await?;

	tracing::info!(
		addr = %listener.local_addr()?,
		project = %config.target.project_id(),
		"Relay is listening."
	);

	axum::serve(listener, router(relay)).with_graceful_shutdown(shutdown_signal()).await?;

	Ok(())
}

async fn send_notification<C>(
	State(relay): State<Arc<Relay<C>>>,
	headers: HeaderMap,
	body: Bytes,
) -> Response
where
	C: ?Sized + RelayHttpClient,
{
	let draft = match parse_draft(&headers, &body) {
		Ok(draft) => draft,
		Err(err) => {
			tracing::warn!(error = %err, "Rejected malformed request body.");

			return ApiResponse::reply(
				StatusCode::BAD_REQUEST,
				MSG_INVALID_BODY,
				Some(err.to_string()),
			);
		},
	};
	let request = match draft.validate() {
		Ok(request) => request,
		Err(err) => {
			tracing::warn!(error = %err, "Rejected incomplete notification.");

			return ApiResponse::reply(StatusCode::BAD_REQUEST, MSG_MISSING_FIELDS, None);
		},
	};

	match relay.send_notification(&request).await {
		Ok(()) => ApiResponse::reply(StatusCode::OK, MSG_SENT, None),
		Err(err) => {
			let diagnostic = err.diagnostic();

			tracing::error!(error = %diagnostic, "Failed to send notification.");

			ApiResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, MSG_SEND_FAILED, Some(diagnostic))
		},
	}
}

/// Reads the request body the way a JSON body parser mounted in front of the route would.
///
/// A body that is empty or not declared as `application/json` is treated as an empty object, so
/// it reaches the missing-fields check instead of failing as malformed.
fn parse_draft(headers: &HeaderMap, body: &[u8]) -> Result<NotificationDraft, serde_json::Error> {
	if !is_json_content_type(headers) || body.iter().all(u8::is_ascii_whitespace) {
		return Ok(NotificationDraft::default());
	}

	serde_json::from_slice(body)
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
	headers
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.split(';').next())
		.is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "Failed to listen for the shutdown signal.");

		std::future::pending::<()>().await;
	}

	tracing::info!("Shutdown signal received.");
}
