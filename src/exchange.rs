//! JWT-bearer grant: trade a signed assertion for an access token.

// crates.io
use oauth2::http::{Method, Request, header::ACCEPT};
// self
use crate::{
	_prelude::*,
	assertion::JwtAssertion,
	auth::AccessToken,
	error::{self, TokenExchangeError, TransportError},
	http::{self, RelayHttpClient},
};

/// `grant_type` value of the JWT-bearer grant (RFC 7523).
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Deserialize)]
struct TokenResponse {
	#[serde(default)]
	access_token: Option<String>,
}

/// Builds the token request: an empty-bodied `POST` carrying `grant_type` and `assertion` as
/// query parameters.
pub fn token_request(
	token_uri: &Url,
	assertion: &JwtAssertion,
) -> Result<oauth2::HttpRequest, TransportError> {
	let mut url = token_uri.clone();

	url.query_pairs_mut()
		.append_pair("grant_type", JWT_BEARER_GRANT_TYPE)
		.append_pair("assertion", assertion.as_str());

	Ok(Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(ACCEPT, "application/json")
		.body(Vec::new())?)
}

/// Exchanges `assertion` at `token_uri` and returns the issued access token.
///
/// A single attempt is made. Non-2xx statuses, transport failures, malformed JSON, and a
/// missing or empty `access_token` all fail with [`TokenExchangeError`].
pub async fn exchange_assertion<C>(
	client: &C,
	token_uri: &Url,
	assertion: &JwtAssertion,
) -> Result<AccessToken, TokenExchangeError>
where
	C: ?Sized + RelayHttpClient,
{
	let request = token_request(token_uri, assertion).map_err(TokenExchangeError::Transport)?;
	let response = http::execute(client, request).await.map_err(TokenExchangeError::Transport)?;
	let status = response.status();

	if !status.is_success() {
		return Err(TokenExchangeError::Rejected {
			status: status.as_u16(),
			body: error::body_preview(response.body()),
		});
	}

	let mut de = serde_json::Deserializer::from_slice(response.body());
	let parsed: TokenResponse = serde_path_to_error::deserialize(&mut de)
		.map_err(|source| TokenExchangeError::Parse { source, status: status.as_u16() })?;

	parsed
		.access_token
		.filter(|token| !token.is_empty())
		.map(AccessToken::new)
		.ok_or(TokenExchangeError::MissingAccessToken { status: status.as_u16() })
}
