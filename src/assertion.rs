//! JWT-bearer assertion builder.
//!
//! An assertion is three base64url (unpadded) segments joined by dots: the JSON header, the JSON
//! claim set, and an RSA-SHA256 signature over `header.claims`. The identity provider accepts
//! it in exchange for an access token scoped to Firebase Cloud Messaging.
//!
//! Header and claims are encoded by hand rather than through [`jsonwebtoken::encode`] so each
//! segment is exactly the canonical JSON of [`JwtHeader`] and [`ClaimSet`]; `jsonwebtoken` only
//! contributes the RS256 primitive.

// crates.io
use base64::{
	Engine,
	engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, auth::ServiceAccountCredential, error::SigningError};

/// OAuth scope granting permission to send messages through FCM.
pub const FIREBASE_MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
/// Validity window of every assertion.
pub const ASSERTION_LIFETIME: Duration = Duration::hours(1);

/// JOSE header of an RS256 assertion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtHeader {
	/// Signature algorithm (`RS256`).
	pub alg: String,
	/// Token type (`JWT`).
	pub typ: String,
}
impl JwtHeader {
	/// Header used for every service account assertion.
	pub fn rs256() -> Self {
		Self { alg: "RS256".into(), typ: "JWT".into() }
	}
}

/// Claims asserted by the service account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
	/// Issuer, the service account email.
	pub iss: String,
	/// Requested OAuth scope.
	pub scope: String,
	/// Audience, the token endpoint.
	pub aud: String,
	/// Issued-at, Unix seconds.
	pub iat: i64,
	/// Expiry, Unix seconds; always `iat + 3600`.
	pub exp: i64,
}
impl ClaimSet {
	/// Builds the claim set for `credential` from a single instant.
	pub fn new(credential: &ServiceAccountCredential, now: OffsetDateTime) -> Self {
		let iat = now.unix_timestamp();

		Self {
			iss: credential.client_email().to_string(),
			scope: FIREBASE_MESSAGING_SCOPE.into(),
			aud: credential.token_uri().to_string(),
			iat,
			exp: iat + ASSERTION_LIFETIME.whole_seconds(),
		}
	}

	/// Returns the validity window (`exp - iat`).
	pub fn lifetime(&self) -> Duration {
		Duration::seconds(self.exp - self.iat)
	}
}

/// Failure while reading a segment back out of an assertion.
#[derive(Debug, ThisError)]
pub enum SegmentError {
	/// Assertion does not have exactly three segments.
	#[error("Assertion must have three dot-separated segments, found {found}.")]
	Shape {
		/// Number of segments present.
		found: usize,
	},
	/// Segment is not valid base64url.
	#[error("Assertion segment is not valid base64url.")]
	Base64(#[from] base64::DecodeError),
	/// Segment does not decode to the expected JSON object.
	#[error("Assertion segment is not the expected JSON object.")]
	Json(#[from] serde_json::Error),
}

/// Signed assertion ready for the JWT-bearer grant.
///
/// Lives only for the duration of one request; `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct JwtAssertion {
	token: String,
	claims: ClaimSet,
}
impl JwtAssertion {
	/// Compact serialization (`header.claims.signature`).
	pub fn as_str(&self) -> &str {
		&self.token
	}

	/// Claims embedded in the assertion.
	pub fn claims(&self) -> &ClaimSet {
		&self.claims
	}

	/// The `header.claims` prefix the signature covers.
	pub fn signing_input(&self) -> &str {
		self.token.rsplit_once('.').map_or(self.token.as_str(), |(input, _)| input)
	}

	/// Splits the compact form into its three raw segments.
	pub fn segments(&self) -> Result<[&str; 3], SegmentError> {
		split_segments(&self.token)
	}

	/// Consumes the assertion, returning the compact serialization.
	pub fn into_string(self) -> String {
		self.token
	}
}
impl Debug for JwtAssertion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JwtAssertion")
			.field("claims", &self.claims)
			.field("token", &"<redacted>")
			.finish()
	}
}

/// Builds and signs a fresh assertion for `credential` at `now`.
///
/// Fails with [`SigningError`] if the key cannot be parsed or signing fails; no partially built
/// token is ever returned.
pub fn build_assertion(
	credential: &ServiceAccountCredential,
	now: OffsetDateTime,
) -> Result<JwtAssertion, SigningError> {
	let key = EncodingKey::from_rsa_pem(credential.private_key().as_bytes())
		.map_err(|source| SigningError::InvalidKey { source })?;
	let claims = ClaimSet::new(credential, now);
	let encoded_header = encode_segment(&JwtHeader::rs256())?;
	let encoded_claims = encode_segment(&claims)?;
	let signing_input = format!("{encoded_header}.{encoded_claims}");
	// `crypto::sign` already returns the unpadded base64url form.
	let signature = jsonwebtoken::crypto::sign(signing_input.as_bytes(), &key, Algorithm::RS256)
		.map_err(|source| SigningError::Sign { source })?;

	Ok(JwtAssertion { token: format!("{signing_input}.{signature}"), claims })
}

/// Checks the RS256 signature of a compact assertion against a PEM public key.
///
/// Returns `Ok(false)` for a well-formed assertion whose signature does not match.
pub fn verify_assertion(token: &str, public_key_pem: &str) -> Result<bool, SigningError> {
	let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
		.map_err(|source| SigningError::InvalidKey { source })?;
	let Ok([header, claims, signature]) = split_segments(token) else {
		return Ok(false);
	};
	let signing_input = format!("{header}.{claims}");

	match jsonwebtoken::crypto::verify(signature, signing_input.as_bytes(), &key, Algorithm::RS256)
	{
		Ok(valid) => Ok(valid),
		// A signature that is not even base64url cannot match.
		Err(err) if matches!(err.kind(), jsonwebtoken::errors::ErrorKind::Base64(_)) => Ok(false),
		Err(source) => Err(SigningError::Sign { source }),
	}
}

/// Decodes one base64url segment back into JSON, re-adding the stripped padding first.
pub fn decode_segment<T>(segment: &str) -> Result<T, SegmentError>
where
	T: DeserializeOwned,
{
	let mut padded = segment.to_owned();

	while padded.len() % 4 != 0 {
		padded.push('=');
	}

	let bytes = URL_SAFE.decode(padded)?;

	Ok(serde_json::from_slice(&bytes)?)
}

fn encode_segment<T>(value: &T) -> Result<String, SigningError>
where
	T: Serialize,
{
	let json = serde_json::to_vec(value).map_err(|source| SigningError::Encode { source })?;

	Ok(URL_SAFE_NO_PAD.encode(json))
}

fn split_segments(token: &str) -> Result<[&str; 3], SegmentError> {
	let parts = token.split('.').collect::<Vec<_>>();

	match parts.as_slice() {
		[header, claims, signature] => Ok([*header, *claims, *signature]),
		_ => Err(SegmentError::Shape { found: parts.len() }),
	}
}
