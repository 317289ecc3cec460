//! Authenticated delivery of one message to the FCM HTTP v1 API.

// crates.io
use oauth2::http::{
	Method, Request,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ProjectId},
	error::{self, ConfigError, DeliveryError, TransportError},
	http::{self, RelayHttpClient},
	notification::NotificationRequest,
};

/// Public FCM base URL.
pub const DEFAULT_FCM_BASE_URL: &str = "https://fcm.googleapis.com";

/// Message envelope accepted by `messages:send`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
	/// The single message to deliver.
	pub message: PushMessage,
}
impl From<&NotificationRequest> for PushPayload {
	fn from(request: &NotificationRequest) -> Self {
		Self {
			message: PushMessage {
				token: request.token().to_owned(),
				notification: PushNotification {
					title: request.title().to_owned(),
					body: request.body().to_owned(),
				},
			},
		}
	}
}

/// Message addressed to one registration token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
	/// Registration token of the target device.
	pub token: String,
	/// Display notification.
	pub notification: PushNotification,
}

/// User-visible part of a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
	/// Notification title.
	pub title: String,
	/// Notification body text.
	pub body: String,
}

/// Resolved `messages:send` endpoint for one project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushTarget {
	project_id: ProjectId,
	endpoint: Url,
}
impl PushTarget {
	/// Targets the public FCM API for `project_id`.
	pub fn fcm(project_id: ProjectId) -> Result<Self, ConfigError> {
		let base = Url::parse(DEFAULT_FCM_BASE_URL).map_err(|source| {
			ConfigError::InvalidEndpoint { url: DEFAULT_FCM_BASE_URL.into(), source }
		})?;

		Self::with_base(&base, project_id)
	}

	/// Targets `<base>/v1/projects/<project_id>/messages:send`.
	///
	/// Any path already present on `base` is kept as a prefix.
	pub fn with_base(base: &Url, project_id: ProjectId) -> Result<Self, ConfigError> {
		let mut endpoint = base.clone();

		endpoint
			.path_segments_mut()
			.map_err(|_| ConfigError::EndpointNotHierarchical { url: base.to_string() })?
			.pop_if_empty()
			.extend(["v1", "projects", project_id.as_ref(), "messages:send"]);
		endpoint.set_query(None);
		endpoint.set_fragment(None);

		Ok(Self { project_id, endpoint })
	}

	/// Project the messages are sent under.
	pub fn project_id(&self) -> &ProjectId {
		&self.project_id
	}

	/// Full `messages:send` URL.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}

/// Builds the `messages:send` request for `request` authorized by `token`.
pub fn push_request(
	target: &PushTarget,
	request: &NotificationRequest,
	token: &AccessToken,
) -> Result<oauth2::HttpRequest, DeliveryError> {
	let body = serde_json::to_vec(&PushPayload::from(request)).map_err(DeliveryError::Encode)?;

	Request::builder()
		.method(Method::POST)
		.uri(target.endpoint().as_str())
		.header(AUTHORIZATION, token.bearer_header())
		.header(CONTENT_TYPE, "application/json")
		.header(ACCEPT, "application/json")
		.body(body)
		.map_err(|err| DeliveryError::Transport(TransportError::from(err)))
}

/// Delivers `request` to `target` using `token`.
///
/// A single attempt is made; any non-2xx status or transport failure fails with
/// [`DeliveryError`].
pub async fn dispatch<C>(
	client: &C,
	target: &PushTarget,
	request: &NotificationRequest,
	token: &AccessToken,
) -> Result<(), DeliveryError>
where
	C: ?Sized + RelayHttpClient,
{
	let http_request = push_request(target, request, token)?;
	let response = http::execute(client, http_request).await.map_err(DeliveryError::Transport)?;
	let status = response.status();

	if status.is_success() {
		Ok(())
	} else {
		Err(DeliveryError::Rejected {
			status: status.as_u16(),
			body: error::body_preview(response.body()),
		})
	}
}
