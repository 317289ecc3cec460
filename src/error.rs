//! Relay-level error types shared across the assertion, exchange, and dispatch stages.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Upper bound on how much of an upstream response body is kept for diagnostics.
pub(crate) const BODY_PREVIEW_LIMIT: usize = 512;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Inbound request is missing required fields.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Assertion could not be signed.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Identity provider rejected the assertion or could not be reached.
	#[error(transparent)]
	TokenExchange(#[from] TokenExchangeError),
	/// Push provider rejected the message or could not be reached.
	#[error(transparent)]
	Delivery(#[from] DeliveryError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Listener or socket failure raised by the HTTP server.
	#[error("Server I/O failed.")]
	Io(#[from] std::io::Error),
}
impl Error {
	/// Returns `true` when the failure was caused by caller input rather than the relay.
	pub fn is_client_error(&self) -> bool {
		matches!(self, Self::Validation(_))
	}

	/// Renders the error and every source in its chain as one line.
	pub fn diagnostic(&self) -> String {
		let mut rendered = self.to_string();
		let mut source = StdError::source(self);

		while let Some(cause) = source {
			rendered.push_str(" Caused by: ");
			rendered.push_str(&cause.to_string());

			source = cause.source();
		}

		rendered
	}
}

/// Inbound notification request failed validation.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// A required field was absent or empty.
	#[error("Missing required field `{field}`.")]
	MissingField {
		/// Name of the first missing field.
		field: &'static str,
	},
}

/// Failures raised while producing a signed JWT assertion.
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// Private key could not be parsed as an RSA PEM.
	#[error("Service account private key is not a valid RSA PEM.")]
	InvalidKey {
		/// Underlying key parsing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Header or claim set could not be serialized.
	#[error("Assertion segment could not be serialized.")]
	Encode {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// RSA-SHA256 signing failed.
	#[error("RSA-SHA256 signing failed.")]
	Sign {
		/// Underlying signing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
}

/// Failures raised while exchanging an assertion for an access token.
#[derive(Debug, ThisError)]
pub enum TokenExchangeError {
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint rejected the assertion with status {status}: {body}.")]
	Rejected {
		/// HTTP status code returned by the token endpoint.
		status: u16,
		/// Preview of the response body.
		body: String,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Token endpoint response omitted `access_token`.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken {
		/// HTTP status code of the response.
		status: u16,
	},
	/// Token endpoint could not be reached.
	#[error("Token endpoint request failed.")]
	Transport(#[source] TransportError),
}

/// Failures raised while delivering a message to the push provider.
#[derive(Debug, ThisError)]
pub enum DeliveryError {
	/// Push provider answered with a non-success status.
	#[error("Push provider rejected the message with status {status}: {body}.")]
	Rejected {
		/// HTTP status code returned by the push provider.
		status: u16,
		/// Preview of the response body.
		body: String,
	},
	/// Push payload could not be serialized.
	#[error("Push payload could not be serialized.")]
	Encode(#[source] serde_json::Error),
	/// Push provider could not be reached.
	#[error("Push provider request failed.")]
	Transport(#[source] TransportError),
}

/// Configuration and validation failures raised at startup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A required environment variable is not set.
	#[error("Environment variable `{name}` is not set.")]
	MissingVar {
		/// Variable name.
		name: &'static str,
	},
	/// An environment variable holds an unusable value.
	#[error("Environment variable `{name}` is invalid: {reason}.")]
	InvalidVar {
		/// Variable name.
		name: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// Service account JSON could not be parsed.
	#[error("Service account credential is not valid JSON.")]
	CredentialParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Service account JSON is structurally valid but unusable.
	#[error("Service account credential field `{field}` is invalid: {reason}.")]
	InvalidCredential {
		/// Offending field.
		field: &'static str,
		/// Why the value was rejected.
		reason: &'static str,
	},
	/// An endpoint URL cannot be parsed.
	#[error("Endpoint `{url}` is not a valid URL.")]
	InvalidEndpoint {
		/// Raw URL string.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// An endpoint URL cannot carry path segments (e.g. `mailto:`).
	#[error("Endpoint `{url}` cannot be used as a base URL.")]
	EndpointNotHierarchical {
		/// Raw URL string.
		url: String,
	},
	/// Project identifier failed validation.
	#[error(transparent)]
	InvalidProjectId(#[from] crate::auth::IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, request construction).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Outbound request could not be assembled.
	#[error("HTTP request could not be built.")]
	Request(#[from] oauth2::http::Error),
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred.")]
	Io(#[from] std::io::Error),
	/// Opaque failure message reported by the HTTP client.
	#[error("HTTP client error: {0}.")]
	Other(String),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Flattens the [`HttpClientError`](oauth2::HttpClientError) emitted by a transport handle.
	pub fn from_client_error<E>(err: oauth2::HttpClientError<E>) -> Self
	where
		E: 'static + Send + Sync + StdError,
	{
		match err {
			oauth2::HttpClientError::Reqwest(inner) => Self::Network { source: inner },
			oauth2::HttpClientError::Http(inner) => Self::Request(inner),
			oauth2::HttpClientError::Io(inner) => Self::Io(inner),
			oauth2::HttpClientError::Other(message) => Self::Other(message),
			_ => Self::Other("unknown transport failure".into()),
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Truncates an upstream body to [`BODY_PREVIEW_LIMIT`] characters for error messages.
pub(crate) fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	if trimmed.chars().count() <= BODY_PREVIEW_LIMIT {
		return trimmed.to_owned();
	}

	let mut preview = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	preview.push('…');

	preview
}
