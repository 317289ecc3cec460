//! Service account credential loaded once per process.

// self
use crate::{
	_prelude::*,
	auth::{ClientEmail, ProjectId},
	error::ConfigError,
};

/// Immutable service account identity used to sign every assertion.
///
/// Built only through [`ServiceAccountCredential::from_json`] or
/// [`ServiceAccountCredential::new`], both of which reject missing or malformed fields before any
/// signing can happen. The private key itself is parsed lazily by the assertion builder so a
/// broken key surfaces as a signing failure on the request that needs it.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceAccountCredential {
	client_email: ClientEmail,
	private_key: String,
	token_uri: Url,
	project_id: Option<ProjectId>,
}
impl ServiceAccountCredential {
	/// Builds a credential from already separated fields.
	pub fn new(
		client_email: impl AsRef<str>,
		private_key: impl Into<String>,
		token_uri: impl AsRef<str>,
	) -> Result<Self, ConfigError> {
		let client_email = ClientEmail::new(client_email).map_err(|_| {
			ConfigError::InvalidCredential {
				field: "client_email",
				reason: "must be a non-empty email address",
			}
		})?;
		let private_key = private_key.into();

		if !looks_like_pem_private_key(&private_key) {
			return Err(ConfigError::InvalidCredential {
				field: "private_key",
				reason: "must be a PEM-encoded private key",
			});
		}

		let token_uri = Url::parse(token_uri.as_ref()).map_err(|_| {
			ConfigError::InvalidCredential { field: "token_uri", reason: "must be an absolute URL" }
		})?;

		if !matches!(token_uri.scheme(), "https" | "http") {
			return Err(ConfigError::InvalidCredential {
				field: "token_uri",
				reason: "must use http or https",
			});
		}

		Ok(Self { client_email, private_key, token_uri, project_id: None })
	}

	/// Parses the service account JSON blob distributed by the identity provider.
	///
	/// Unknown fields (`type`, `private_key_id`, `auth_uri`, ...) are ignored. `project_id` is
	/// optional and kept as the default push project.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let blob: ServiceAccountBlob = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::CredentialParse { source })?;
		let mut credential = Self::new(blob.client_email, blob.private_key, blob.token_uri)?;

		if let Some(project_id) = blob.project_id.filter(|value| !value.is_empty()) {
			credential.project_id = Some(ProjectId::new(project_id)?);
		}

		Ok(credential)
	}

	/// Attaches or replaces the project identifier.
	pub fn with_project_id(mut self, project_id: ProjectId) -> Self {
		self.project_id = Some(project_id);

		self
	}

	/// Issuer identity placed in the `iss` claim.
	pub fn client_email(&self) -> &ClientEmail {
		&self.client_email
	}

	/// PEM-encoded RSA private key. Callers must avoid logging this string.
	pub fn private_key(&self) -> &str {
		&self.private_key
	}

	/// Token endpoint used both as the exchange target and the `aud` claim.
	pub fn token_uri(&self) -> &Url {
		&self.token_uri
	}

	/// Project identifier shipped with the credential, if any.
	pub fn project_id(&self) -> Option<&ProjectId> {
		self.project_id.as_ref()
	}
}
impl Debug for ServiceAccountCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ServiceAccountCredential")
			.field("client_email", &self.client_email)
			.field("private_key", &"<redacted>")
			.field("token_uri", &self.token_uri.as_str())
			.field("project_id", &self.project_id)
			.finish()
	}
}

#[derive(Deserialize)]
struct ServiceAccountBlob {
	client_email: String,
	private_key: String,
	token_uri: String,
	#[serde(default)]
	project_id: Option<String>,
}

fn looks_like_pem_private_key(value: &str) -> bool {
	let trimmed = value.trim();

	trimmed.starts_with("-----BEGIN ")
		&& trimmed.contains("PRIVATE KEY-----")
		&& trimmed.ends_with("-----")
}
