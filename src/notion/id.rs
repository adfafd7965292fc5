//! Canonical Notion identifiers.
//!
//! The canonical form is 32 lowercase hex characters grouped `8-4-4-4-12`. Input may omit the
//! dashes or carry a non-hex prefix (page slugs such as `DocDelta-ReadMe-<hex>`); anything
//! without a recognizable identifier, placeholders like `TO_FILL` included, is rejected.

// std
use std::{ops::Deref, sync::LazyLock};
// crates.io
use regex::Regex;
// self
use crate::{_prelude::*, error::ValidationError};

static DASHED_ID: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
		.expect("Dashed identifier pattern should compile.")
});
static HEX_RUN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[0-9a-fA-F]+").expect("Hex run pattern should compile."));

/// Normalized page, block, or database identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockId(String);
impl BlockId {
	/// Extracts and normalizes the identifier embedded in `input`.
	pub fn parse(input: impl AsRef<str>) -> Result<Self, ValidationError> {
		normalize_id(input.as_ref()).map(Self)
	}

	/// Returns the identifier without dashes.
	pub fn simple(&self) -> String {
		self.0.replace('-', "")
	}
}
impl Deref for BlockId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for BlockId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<BlockId> for String {
	fn from(value: BlockId) -> Self {
		value.0
	}
}
impl TryFrom<String> for BlockId {
	type Error = ValidationError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(value)
	}
}
impl FromStr for BlockId {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl Debug for BlockId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "BlockId({})", self.0)
	}
}
impl Display for BlockId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Returns the canonical dashed, lowercase form of the identifier embedded in `input`.
///
/// A dashed identifier anywhere in the input wins; otherwise the first run of exactly 32 hex
/// characters is used. Two shapes are ambiguous and rejected:
///
/// - dashes anywhere but the `8-4-4-4-12` positions (`2d322f89689b-8005a4e8...`), since the
///   pieces are separate hex runs;
/// - a prefix ending in a hex letter with no separator (`ReadMe2d322f89...`), since the
///   trailing `e` joins the run and makes it 33 characters long.
pub fn normalize_id(input: &str) -> Result<String, ValidationError> {
	if let Some(found) = DASHED_ID.find(input) {
		return Ok(found.as_str().to_ascii_lowercase());
	}

	let run = HEX_RUN
		.find_iter(input)
		.map(|m| m.as_str())
		.find(|run| run.len() == 32)
		.ok_or_else(|| ValidationError::MalformedId { input: input.to_owned() })?;
	let hex = run.to_ascii_lowercase();

	Ok(format!("{}-{}-{}-{}-{}", &hex[..8], &hex[8..12], &hex[12..16], &hex[16..20], &hex[20..]))
}

/// Returns `true` when `input` carries a usable identifier.
pub fn is_valid_id(input: &str) -> bool {
	normalize_id(input).is_ok()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const CANONICAL: &str = "2d322f89-689b-8005-a4e8-c224ae074ddd";

	#[test]
	fn rejects_placeholders_and_garbage() {
		assert!(!is_valid_id("TO_FILL"));
		assert!(!is_valid_id(""));
		assert!(!is_valid_id("not-a-uuid"));
		assert!(!is_valid_id("2d322f89689b8005a4e8c224ae074dd"));
		assert!(!is_valid_id("2d322f89689b8005a4e8c224ae074ddd0"));
		assert!(matches!(BlockId::parse("TO_FILL"), Err(ValidationError::MalformedId { .. })));
	}

	#[test]
	fn accepts_dashless_dashed_and_prefixed_forms() {
		assert!(is_valid_id("2d322f89689b8005a4e8c224ae074ddd"));
		assert!(is_valid_id("DocDelta-2d322f89-689b-8005-a4e8-c224ae074ddd"));

		for input in [
			"2d322f89689b8005a4e8c224ae074ddd",
			"2D322F89689B8005A4E8C224AE074DDD",
			"2d322f89-689b-8005-a4e8-c224ae074ddd",
			"DocDelta-2d322f89-689b-8005-a4e8-c224ae074ddd",
			"DocDelta-ReadMe-2d322f89689b8005a4e8c224ae074ddd",
			"https://www.notion.so/DocDelta-ReadMe-2d322f89689b8005a4e8c224ae074ddd?pvs=4",
		] {
			assert_eq!(normalize_id(input).as_deref(), Ok(CANONICAL), "input: {input}");
		}
	}

	#[test]
	fn rejects_misplaced_dashes_and_glued_hex_prefixes() {
		for input in [
			"2d322f89689b-8005a4e8c224ae074ddd",
			"2d322f8-9689b-8005-a4e8-c224ae074ddd",
			"ReadMe2d322f89689b8005a4e8c224ae074ddd",
			"Cafe2d322f89689b8005a4e8c224ae074ddd",
		] {
			assert_eq!(
				normalize_id(input),
				Err(ValidationError::MalformedId { input: input.into() }),
				"input: {input}"
			);
		}

		assert_eq!(normalize_id("ReadMe-2d322f89689b8005a4e8c224ae074ddd").as_deref(), Ok(CANONICAL));
	}

	#[test]
	fn normalization_is_idempotent_and_canonical() {
		let shape = Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
			.expect("Shape pattern should compile.");

		for input in [
			"DocDelta-ReadMe-2d322f89689b8005a4e8c224ae074ddd",
			"AbCdEf0123456789abcdef0123456789",
			"page 0123abcd-4567-89ab-cdef-0123456789AB end",
		] {
			let once = normalize_id(input).expect("Fixture should normalize.");
			let twice = normalize_id(&once).expect("Canonical form should normalize.");

			assert_eq!(once, twice);
			assert!(shape.is_match(&once), "{once}");
		}
	}

	#[test]
	fn serde_normalizes_on_the_way_in() {
		let id: BlockId = serde_json::from_str("\"2d322f89689b8005a4e8c224ae074ddd\"")
			.expect("Dashless id should deserialize.");

		assert_eq!(id.as_ref(), CANONICAL);
		assert_eq!(id.simple(), "2d322f89689b8005a4e8c224ae074ddd");
		assert_eq!(serde_json::to_string(&id).expect("Id should serialize."), format!("\"{CANONICAL}\""));
		assert!(serde_json::from_str::<BlockId>("\"TO_FILL\"").is_err());
	}
}
