//! Process configuration, resolved once at startup and passed explicitly.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{ProjectId, ServiceAccountCredential},
	dispatch::{DEFAULT_FCM_BASE_URL, PushTarget},
	error::ConfigError,
};

/// Environment variable holding the service account JSON blob.
pub const ENV_SERVICE_ACCOUNT: &str = "FCM_SERVICE_ACCOUNT";
/// Environment variable overriding the project of the service account.
pub const ENV_PROJECT_ID: &str = "FCM_PROJECT_ID";
/// Environment variable overriding the push provider base URL.
pub const ENV_ENDPOINT: &str = "FCM_ENDPOINT";
/// Environment variable holding the listening port.
pub const ENV_PORT: &str = "PORT";
/// Environment variable holding the outbound request timeout in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "FCM_RELAY_HTTP_TIMEOUT_SECS";

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3000;
/// Outbound request timeout used when `FCM_RELAY_HTTP_TIMEOUT_SECS` is unset.
pub const DEFAULT_HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Everything the relay needs to serve requests.
#[derive(Clone, Debug)]
pub struct AppConfig {
	/// Service account used to sign assertions.
	pub credential: Arc<ServiceAccountCredential>,
	/// Resolved `messages:send` endpoint.
	pub target: PushTarget,
	/// TCP port the HTTP server binds on all interfaces.
	pub port: u16,
	/// Upper bound for each outbound call.
	pub http_timeout: StdDuration,
}
impl AppConfig {
	/// Reads the process environment, seeding it from `.env` first when the file exists.
	pub fn from_env() -> Result<Self, ConfigError> {
		#[cfg(feature = "server")]
		if let Err(err) = dotenv::dotenv() {
			if !err.not_found() {
				return Err(ConfigError::InvalidVar { name: ".env", reason: err.to_string() });
			}
		}

		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Resolves the configuration from an arbitrary variable source.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &'static str| lookup(name).filter(|value| !value.trim().is_empty());
		let raw_credential =
			var(ENV_SERVICE_ACCOUNT).ok_or(ConfigError::MissingVar { name: ENV_SERVICE_ACCOUNT })?;
		let credential = ServiceAccountCredential::from_json(&raw_credential)?;
		let project_id = match var(ENV_PROJECT_ID) {
			Some(raw) => ProjectId::new(raw.trim())?,
			None => credential
				.project_id()
				.cloned()
				.ok_or(ConfigError::MissingVar { name: ENV_PROJECT_ID })?,
		};
		let base_raw = var(ENV_ENDPOINT).unwrap_or_else(|| DEFAULT_FCM_BASE_URL.to_owned());
		let base = Url::parse(base_raw.trim())
			.map_err(|source| ConfigError::InvalidEndpoint { url: base_raw.clone(), source })?;
		let target = PushTarget::with_base(&base, project_id.clone())?;
		let port = match var(ENV_PORT) {
			Some(raw) => raw.trim().parse::<u16>().map_err(|err| ConfigError::InvalidVar {
				name: ENV_PORT,
				reason: err.to_string(),
			})?,
			None => DEFAULT_PORT,
		};
		let http_timeout = match var(ENV_HTTP_TIMEOUT_SECS) {
			Some(raw) => parse_timeout(&raw)?,
			None => DEFAULT_HTTP_TIMEOUT,
		};

		Ok(Self {
			credential: Arc::new(credential.with_project_id(project_id)),
			target,
			port,
			http_timeout,
		})
	}
}

fn parse_timeout(raw: &str) -> Result<StdDuration, ConfigError> {
	let secs = raw.trim().parse::<u64>().map_err(|err| ConfigError::InvalidVar {
		name: ENV_HTTP_TIMEOUT_SECS,
		reason: err.to_string(),
	})?;

	if secs == 0 {
		return Err(ConfigError::InvalidVar {
			name: ENV_HTTP_TIMEOUT_SECS,
			reason: "must be at least one second".into(),
		});
	}

	Ok(StdDuration::from_secs(secs))
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	fn service_account(project_id: Option<&str>) -> String {
		let mut blob = serde_json::json!({
			"type": "service_account",
			"client_email": "relay@demo-9f30d.iam.gserviceaccount.com",
			"private_key": include_str!("../tests/fixtures/service_account_key.pem"),
			"token_uri": "https://oauth2.googleapis.com/token",
		});

		if let Some(project_id) = project_id {
			blob["project_id"] = project_id.into();
		}

		blob.to_string()
	}

	fn lookup(vars: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
		let vars = vars
			.iter()
			.map(|(name, value)| ((*name).to_owned(), value.clone()))
			.collect::<HashMap<_, _>>();

		move |name| vars.get(name).cloned()
	}

	#[test]
	fn defaults_apply_when_only_the_credential_is_set() {
		let vars = [(ENV_SERVICE_ACCOUNT, service_account(Some("demo-9f30d")))];
		let config =
			AppConfig::from_lookup(lookup(&vars)).expect("Minimal configuration should resolve.");

		assert_eq!(config.port, DEFAULT_PORT);
		assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
		assert_eq!(
			config.target.endpoint().as_str(),
			"https://fcm.googleapis.com/v1/projects/demo-9f30d/messages:send"
		);
	}

	#[test]
	fn explicit_variables_override_defaults() {
		let config = AppConfig::from_lookup(lookup(&[
			(ENV_SERVICE_ACCOUNT, service_account(Some("from-blob"))),
			(ENV_PROJECT_ID, "from-env".into()),
			(ENV_ENDPOINT, "http://127.0.0.1:9000".into()),
			(ENV_PORT, "8080".into()),
			(ENV_HTTP_TIMEOUT_SECS, "5".into()),
		]))
		.expect("Full configuration should resolve.");

		assert_eq!(config.port, 8080);
		assert_eq!(config.http_timeout, StdDuration::from_secs(5));
		assert_eq!(config.target.project_id().as_ref(), "from-env");
		assert_eq!(
			config.target.endpoint().as_str(),
			"http://127.0.0.1:9000/v1/projects/from-env/messages:send"
		);
		assert_eq!(config.credential.project_id().map(|id| id.as_ref()), Some("from-env"));
	}

	#[test]
	fn missing_or_broken_variables_fail_startup() {
		let err = AppConfig::from_lookup(lookup(&[])).expect_err("Credential is required.");

		assert!(matches!(err, ConfigError::MissingVar { name: ENV_SERVICE_ACCOUNT }));

		let err = AppConfig::from_lookup(lookup(&[(ENV_SERVICE_ACCOUNT, service_account(None))]))
			.expect_err("A project must come from somewhere.");

		assert!(matches!(err, ConfigError::MissingVar { name: ENV_PROJECT_ID }));

		let err = AppConfig::from_lookup(lookup(&[
			(ENV_SERVICE_ACCOUNT, service_account(Some("demo"))),
			(ENV_PORT, "not-a-port".into()),
		]))
		.expect_err("Port must be numeric.");

		assert!(matches!(err, ConfigError::InvalidVar { name: ENV_PORT, .. }));

		let err = AppConfig::from_lookup(lookup(&[
			(ENV_SERVICE_ACCOUNT, service_account(Some("demo"))),
			(ENV_HTTP_TIMEOUT_SECS, "0".into()),
		]))
		.expect_err("Zero timeout is rejected.");

		assert!(matches!(err, ConfigError::InvalidVar { name: ENV_HTTP_TIMEOUT_SECS, .. }));
	}
}
