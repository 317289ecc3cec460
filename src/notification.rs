//! Inbound notification requests and their validation gate.

// self
use crate::{_prelude::*, error::ValidationError};

/// Raw inbound payload as deserialized from the request body.
///
/// Every field is optional so that missing fields surface as a [`ValidationError`] instead of
/// a deserialization failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDraft {
	/// Notification title.
	#[serde(default)]
	pub title: Option<String>,
	/// Notification body text.
	#[serde(default)]
	pub body: Option<String>,
	/// Registration token of the target device.
	#[serde(default)]
	pub token: Option<String>,
}
impl NotificationDraft {
	/// Checks that `title`, `body`, and `token` are all present and non-empty.
	pub fn validate(self) -> Result<NotificationRequest, ValidationError> {
		let title = require("title", self.title)?;
		let body = require("body", self.body)?;
		let token = require("token", self.token)?;

		Ok(NotificationRequest { title, body, token })
	}
}

/// Validated notification addressed to a single device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationRequest {
	title: String,
	body: String,
	token: String,
}
impl NotificationRequest {
	/// Validates the three fields directly.
	pub fn new(
		title: impl Into<String>,
		body: impl Into<String>,
		token: impl Into<String>,
	) -> Result<Self, ValidationError> {
		NotificationDraft {
			title: Some(title.into()),
			body: Some(body.into()),
			token: Some(token.into()),
		}
		.validate()
	}

	/// Notification title.
	pub fn title(&self) -> &str {
		&self.title
	}

	/// Notification body text.
	pub fn body(&self) -> &str {
		&self.body
	}

	/// Registration token of the target device.
	pub fn token(&self) -> &str {
		&self.token
	}
}

fn require(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
	value.filter(|value| !value.is_empty()).ok_or(ValidationError::MissingField { field })
}
