//! `fcm-relay` binary: load configuration from the environment and serve
//! `POST /api/sendNotification`.

// self
use fcm_relay::{config::AppConfig, error::Result, obs, server};

#[tokio::main]
async fn main() -> Result<()> {
	obs::init_subscriber();

	let config = AppConfig::from_env()?;

	server::serve(config).await
}
