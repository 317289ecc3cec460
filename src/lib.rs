//! Stateless FCM relay: self-sign a service account JWT, trade it for an OAuth 2.0 bearer token,
//! and deliver one push notification per request.
//!
//! The credential flow lives in three leaf modules composed by [`relay::Relay`]:
//! [`assertion`] signs, [`exchange`] trades the assertion for an access token, and [`dispatch`]
//! posts the message. The `server` feature wraps the relay in a single axum route.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod assertion;
pub mod auth;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod exchange;
pub mod http;
pub mod notification;
pub mod obs;
pub mod relay;
#[cfg(feature = "server")] pub mod server;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tower as _};
