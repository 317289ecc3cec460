//! Validated identifiers that end up inside URLs and JWT claims.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $rule:path) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;
				$rule($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;
				$rule($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (project, client email).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (project, client email).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (project, client email).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The identifier contains a character that would break the URL or claim it lands in.
	#[error("{kind} identifier contains the forbidden character `{found}`.")]
	ForbiddenCharacter {
		/// Kind of identifier (project, client email).
		kind: &'static str,
		/// Offending character.
		found: char,
	},
	/// The identifier does not look like an email address.
	#[error("{kind} identifier must be an email address.")]
	NotAnEmail {
		/// Kind of identifier.
		kind: &'static str,
	},
}

def_id! {
	ProjectId,
	"Firebase project identifier embedded in the push endpoint path.",
	"Project",
	validate_path_segment
}
def_id! {
	ClientEmail,
	"Service account email used as the `iss` claim of every assertion.",
	"ClientEmail",
	validate_email
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

fn validate_path_segment(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	match view.chars().find(|c| matches!(c, '/' | '?' | '#' | '%' | ':')) {
		Some(found) => Err(IdentifierError::ForbiddenCharacter { kind, found }),
		None => Ok(()),
	}
}

fn validate_email(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	match view.split_once('@') {
		Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
		_ => Err(IdentifierError::NotAnEmail { kind }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn project_ids_reject_url_breaking_characters() {
		let project = ProjectId::new("demo-9f30d").expect("Project fixture should be valid.");

		assert_eq!(project.as_ref(), "demo-9f30d");
		assert!(ProjectId::new("").is_err());
		assert!(ProjectId::new("demo project").is_err());
		assert_eq!(
			ProjectId::new("demo/../admin"),
			Err(IdentifierError::ForbiddenCharacter { kind: "Project", found: '/' }),
		);
		assert!(ProjectId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn client_emails_need_both_halves() {
		ClientEmail::new("relay@demo.iam.gserviceaccount.com")
			.expect("Service account email should be valid.");

		assert_eq!(
			ClientEmail::new("relay"),
			Err(IdentifierError::NotAnEmail { kind: "ClientEmail" })
		);
		assert!(ClientEmail::new("@demo.iam.gserviceaccount.com").is_err());
		assert!(ClientEmail::new("relay@").is_err());
	}

	#[test]
	fn serde_enforces_validation() {
		let project: ProjectId =
			serde_json::from_str("\"demo-42\"").expect("Project should deserialize successfully.");

		assert_eq!(format!("{project:?}"), "Project(demo-42)");
		assert!(serde_json::from_str::<ProjectId>("\"with space\"").is_err());
		assert!(serde_json::from_str::<ClientEmail>("\"not-an-email\"").is_err());
	}
}
