//! Strongly typed GitHub identifiers validated at construction.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::{_prelude::*, error::ValidationError};

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $validate:path) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
				let view = value.as_ref();

				$validate(view)?;

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
			type Error = ValidationError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				$validate(&value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
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
			type Err = ValidationError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

def_id! { AppId, "GitHub App identifier used as the assertion issuer.", "AppId", validate_app_id }
def_id! {
	RepositoryName,
	"Fully qualified `owner/name` repository on which the app is installed.",
	"RepositoryName",
	validate_repository
}
impl RepositoryName {
	/// Returns the owner segment.
	pub fn owner(&self) -> &str {
		self.0.split_once('/').map(|(owner, _)| owner).unwrap_or_default()
	}

	/// Returns the repository segment.
	pub fn name(&self) -> &str {
		self.0.split_once('/').map(|(_, name)| name).unwrap_or_default()
	}
}

fn validate_app_id(view: &str) -> Result<(), ValidationError> {
	if view.is_empty() || view.chars().any(char::is_whitespace) {
		return Err(ValidationError::InvalidAppId { input: view.to_owned() });
	}

	Ok(())
}

fn validate_repository(view: &str) -> Result<(), ValidationError> {
	let invalid = || ValidationError::InvalidRepository { input: view.to_owned() };
	let (owner, name) = view.split_once('/').ok_or_else(invalid)?;
	let segment_ok = |segment: &str| {
		!segment.is_empty()
			&& segment
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
	};

	if !segment_ok(owner) || !segment_ok(name) {
		return Err(invalid());
	}

	Ok(())
}
