//! Block models: outgoing [`BlockSpec`] values and incoming [`Block`] snapshots.
//!
//! Block specs are a closed set of variants, each carrying only the payload its type needs.
//! They serialize to the document host's wire shape (`{"object":"block","type":T,T:{..}}`).
//! Incoming blocks keep the flattened plain text and the few per-type attributes the editor
//! reads; types outside the modeled set are kept as [`BlockKind::Other`] so a page with
//! images or tables still reads cleanly.

// crates.io
use serde::Serializer;
// self
use crate::{_prelude::*, error::ValidationError, notion::BlockId};

/// Language applied to code blocks when none is given.
pub const DEFAULT_CODE_LANGUAGE: &str = "python";
/// Emoji applied to callouts when none is given.
pub const DEFAULT_CALLOUT_ICON: &str = "💡";
/// Maximum characters the host accepts in a single rich-text run.
pub const RICH_TEXT_LIMIT: usize = 2000;

/// Heading depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeadingLevel {
	/// `heading_1`.
	One,
	/// `heading_2`.
	Two,
	/// `heading_3`.
	Three,
}

/// Block type as named on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
	/// Heading of the given level.
	Heading(HeadingLevel),
	/// `paragraph`.
	Paragraph,
	/// `bulleted_list_item`.
	BulletedItem,
	/// `numbered_list_item`.
	NumberedItem,
	/// `quote`.
	Quote,
	/// `code`.
	Code,
	/// `callout`.
	Callout,
	/// `divider`.
	Divider,
	/// `toggle`.
	Toggle,
	/// `to_do`.
	CheckboxItem,
	/// `table_of_contents`.
	TableOfContents,
	/// Any type this crate does not model (image, table, embed, ...).
	Other(String),
}
impl BlockKind {
	/// Parses a wire type name. Unknown names become [`BlockKind::Other`].
	pub fn from_wire(name: &str) -> Self {
		match name {
			"heading_1" => Self::Heading(HeadingLevel::One),
			"heading_2" => Self::Heading(HeadingLevel::Two),
			"heading_3" => Self::Heading(HeadingLevel::Three),
			"paragraph" => Self::Paragraph,
			"bulleted_list_item" => Self::BulletedItem,
			"numbered_list_item" => Self::NumberedItem,
			"quote" => Self::Quote,
			"code" => Self::Code,
			"callout" => Self::Callout,
			"divider" => Self::Divider,
			"toggle" => Self::Toggle,
			"to_do" => Self::CheckboxItem,
			"table_of_contents" => Self::TableOfContents,
			other => Self::Other(other.to_owned()),
		}
	}

	/// Returns the wire type name.
	pub fn as_wire(&self) -> &str {
		match self {
			Self::Heading(HeadingLevel::One) => "heading_1",
			Self::Heading(HeadingLevel::Two) => "heading_2",
			Self::Heading(HeadingLevel::Three) => "heading_3",
			Self::Paragraph => "paragraph",
			Self::BulletedItem => "bulleted_list_item",
			Self::NumberedItem => "numbered_list_item",
			Self::Quote => "quote",
			Self::Code => "code",
			Self::Callout => "callout",
			Self::Divider => "divider",
			Self::Toggle => "toggle",
			Self::CheckboxItem => "to_do",
			Self::TableOfContents => "table_of_contents",
			Self::Other(name) => name,
		}
	}

	/// Returns `true` for headings of any level.
	pub fn is_heading(&self) -> bool {
		matches!(self, Self::Heading(_))
	}

	/// Returns `true` for the body types reported by section listings.
	pub fn is_text_bearing(&self) -> bool {
		matches!(self, Self::Paragraph | Self::BulletedItem | Self::NumberedItem)
	}
}
impl Display for BlockKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_wire())
	}
}
impl Serialize for BlockKind {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.as_wire())
	}
}

/// Block to be created, in a type-checked shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockSpec {
	/// Heading of any level.
	Heading {
		/// Depth.
		level: HeadingLevel,
		/// Heading text.
		text: String,
	},
	/// Plain paragraph.
	Paragraph(String),
	/// Bulleted list item.
	BulletedItem(String),
	/// Numbered list item.
	NumberedItem(String),
	/// Block quote.
	Quote(String),
	/// Code listing.
	Code {
		/// Source text.
		code: String,
		/// Highlighting language.
		language: String,
	},
	/// Callout with an emoji icon.
	Callout {
		/// Callout text.
		text: String,
		/// Emoji glyph.
		icon: String,
	},
	/// Horizontal rule.
	Divider,
	/// Collapsible block with optional nested children.
	Toggle {
		/// Summary line.
		summary: String,
		/// Nested blocks.
		children: Vec<BlockSpec>,
	},
	/// To-do item.
	CheckboxItem {
		/// Item text.
		text: String,
		/// Whether the box is ticked.
		checked: bool,
	},
	/// Automatic table of contents.
	TableOfContents,
}
impl BlockSpec {
	/// `heading_1` block.
	pub fn heading1(text: impl Into<String>) -> Self {
		Self::Heading { level: HeadingLevel::One, text: text.into() }
	}

	/// `heading_2` block.
	pub fn heading2(text: impl Into<String>) -> Self {
		Self::Heading { level: HeadingLevel::Two, text: text.into() }
	}

	/// `heading_3` block.
	pub fn heading3(text: impl Into<String>) -> Self {
		Self::Heading { level: HeadingLevel::Three, text: text.into() }
	}

	/// Paragraph block.
	pub fn paragraph(text: impl Into<String>) -> Self {
		Self::Paragraph(text.into())
	}

	/// Bulleted list item.
	pub fn bullet_item(text: impl Into<String>) -> Self {
		Self::BulletedItem(text.into())
	}

	/// Numbered list item.
	pub fn numbered_item(text: impl Into<String>) -> Self {
		Self::NumberedItem(text.into())
	}

	/// Quote block.
	pub fn quote(text: impl Into<String>) -> Self {
		Self::Quote(text.into())
	}

	/// Code block highlighted as [`DEFAULT_CODE_LANGUAGE`].
	pub fn code(code: impl Into<String>) -> Self {
		Self::code_in(code, DEFAULT_CODE_LANGUAGE)
	}

	/// Code block with an explicit language.
	pub fn code_in(code: impl Into<String>, language: impl Into<String>) -> Self {
		Self::Code { code: code.into(), language: language.into() }
	}

	/// Callout with [`DEFAULT_CALLOUT_ICON`].
	pub fn callout(text: impl Into<String>) -> Self {
		Self::callout_with_icon(text, DEFAULT_CALLOUT_ICON)
	}

	/// Callout with an explicit emoji.
	pub fn callout_with_icon(text: impl Into<String>, icon: impl Into<String>) -> Self {
		Self::Callout { text: text.into(), icon: icon.into() }
	}

	/// Divider block.
	pub fn divider() -> Self {
		Self::Divider
	}

	/// Toggle block; `children` may be empty.
	pub fn toggle(summary: impl Into<String>, children: Vec<BlockSpec>) -> Self {
		Self::Toggle { summary: summary.into(), children }
	}

	/// Unchecked to-do item.
	pub fn checkbox_item(text: impl Into<String>) -> Self {
		Self::checkbox_item_with(text, false)
	}

	/// To-do item with an explicit state.
	pub fn checkbox_item_with(text: impl Into<String>, checked: bool) -> Self {
		Self::CheckboxItem { text: text.into(), checked }
	}

	/// Table of contents block.
	pub fn table_of_contents() -> Self {
		Self::TableOfContents
	}

	/// Returns the wire type this spec creates.
	pub fn kind(&self) -> BlockKind {
		match self {
			Self::Heading { level, .. } => BlockKind::Heading(*level),
			Self::Paragraph(_) => BlockKind::Paragraph,
			Self::BulletedItem(_) => BlockKind::BulletedItem,
			Self::NumberedItem(_) => BlockKind::NumberedItem,
			Self::Quote(_) => BlockKind::Quote,
			Self::Code { .. } => BlockKind::Code,
			Self::Callout { .. } => BlockKind::Callout,
			Self::Divider => BlockKind::Divider,
			Self::Toggle { .. } => BlockKind::Toggle,
			Self::CheckboxItem { .. } => BlockKind::CheckboxItem,
			Self::TableOfContents => BlockKind::TableOfContents,
		}
	}

	/// Renders the host wire shape.
	pub fn to_wire(&self) -> Value {
		let payload = match self {
			Self::Heading { text, .. }
			| Self::Paragraph(text)
			| Self::BulletedItem(text)
			| Self::NumberedItem(text)
			| Self::Quote(text) => json!({ "rich_text": rich_text(text) }),
			Self::Code { code, language } =>
				json!({ "rich_text": rich_text(code), "language": language }),
			Self::Callout { text, icon } => json!({
				"rich_text": rich_text(text),
				"icon": { "type": "emoji", "emoji": icon },
			}),
			Self::Toggle { summary, children } => {
				let mut payload = json!({ "rich_text": rich_text(summary) });

				if !children.is_empty() {
					payload["children"] = children.iter().map(Self::to_wire).collect();
				}

				payload
			},
			Self::CheckboxItem { text, checked } =>
				json!({ "rich_text": rich_text(text), "checked": checked }),
			Self::Divider | Self::TableOfContents => json!({}),
		};
		let kind = self.kind();
		let mut block = json!({ "object": "block", "type": kind.as_wire() });

		block[kind.as_wire()] = payload;

		block
	}
}
impl Serialize for BlockSpec {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.to_wire().serialize(serializer)
	}
}

/// Loosely typed block description (`{"type":"bullet","text":"..","extra":".."}`).
///
/// `extra` carries the code language, callout emoji, or to-do state; an empty `extra` falls
/// back to the type's default. Unknown `type` strings are rejected rather than downgraded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTemplate {
	/// Short or wire type name.
	#[serde(rename = "type")]
	pub kind: String,
	/// Block text.
	#[serde(default)]
	pub text: String,
	/// Per-type parameter.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub extra: Option<String>,
	/// Nested blocks (toggles only).
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<BlockTemplate>,
}
impl BlockTemplate {
	/// Creates a template with no extra parameter.
	pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
		Self { kind: kind.into(), text: text.into(), ..Default::default() }
	}

	/// Sets the per-type parameter.
	pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
		self.extra = Some(extra.into());

		self
	}
}
impl TryFrom<BlockTemplate> for BlockSpec {
	type Error = ValidationError;

	fn try_from(template: BlockTemplate) -> Result<Self, Self::Error> {
		let BlockTemplate { kind, text, extra, children } = template;
		let extra = extra.filter(|value| !value.trim().is_empty());
		let spec = match kind.as_str() {
			"h1" | "heading_1" => Self::heading1(text),
			"h2" | "heading_2" => Self::heading2(text),
			"h3" | "heading_3" => Self::heading3(text),
			"paragraph" | "p" => Self::paragraph(text),
			"bullet" | "bulleted_list_item" => Self::bullet_item(text),
			"numbered" | "numbered_list_item" => Self::numbered_item(text),
			"quote" => Self::quote(text),
			"code" => Self::code_in(text, extra.as_deref().unwrap_or(DEFAULT_CODE_LANGUAGE)),
			"callout" =>
				Self::callout_with_icon(text, extra.as_deref().unwrap_or(DEFAULT_CALLOUT_ICON)),
			"divider" => Self::divider(),
			"todo" | "to_do" => Self::checkbox_item_with(
				text,
				extra.is_some_and(|value| {
					matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
				}),
			),
			"toggle" => Self::toggle(
				text,
				children.into_iter().map(Self::try_from).collect::<Result<Vec<_>, _>>()?,
			),
			"toc" | "table_of_contents" => Self::table_of_contents(),
			_ => return Err(ValidationError::UnknownBlockType { kind }),
		};

		Ok(spec)
	}
}

/// Snapshot of a block as returned by the document host.
///
/// Serializes back into the host's block shape, so a stored snapshot reads in unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct Block {
	/// Host-assigned identifier.
	pub id: BlockId,
	/// Block type.
	pub kind: BlockKind,
	/// Flattened plain text of the block's rich text.
	pub text: String,
	/// Code language (code blocks only).
	pub language: Option<String>,
	/// Emoji icon (callouts only).
	pub icon: Option<String>,
	/// Checkbox state (to-do items only).
	pub checked: Option<bool>,
	/// Whether the block has nested children.
	pub has_children: bool,
}

#[derive(Serialize, Deserialize)]
struct RawBlock {
	id: String,
	#[serde(rename = "type")]
	kind: String,
	#[serde(default)]
	has_children: bool,
	#[serde(flatten)]
	rest: serde_json::Map<String, Value>,
}
impl TryFrom<RawBlock> for Block {
	type Error = ValidationError;

	fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
		let id = BlockId::parse(&raw.id)?;
		let payload = raw.rest.get(&raw.kind);
		let field = |name: &str| payload.and_then(|payload| payload.get(name));
		let text = field("rich_text").map(flatten_rich_text).unwrap_or_default();
		let language = field("language").and_then(Value::as_str).map(ToOwned::to_owned);
		let icon = field("icon")
			.and_then(|icon| icon.get("emoji"))
			.and_then(Value::as_str)
			.map(ToOwned::to_owned);
		let checked = field("checked").and_then(Value::as_bool);

		Ok(Self {
			id,
			kind: BlockKind::from_wire(&raw.kind),
			text,
			language,
			icon,
			checked,
			has_children: raw.has_children,
		})
	}
}

impl From<Block> for RawBlock {
	fn from(block: Block) -> Self {
		let kind = block.kind.as_wire().to_owned();
		let mut payload = serde_json::Map::new();

		if !block.text.is_empty() {
			payload.insert(
				"rich_text".into(),
				json!([{ "type": "text", "text": { "content": block.text }, "plain_text": block.text }]),
			);
		}
		if let Some(language) = block.language {
			payload.insert("language".into(), Value::String(language));
		}
		if let Some(icon) = block.icon {
			payload.insert("icon".into(), json!({ "type": "emoji", "emoji": icon }));
		}
		if let Some(checked) = block.checked {
			payload.insert("checked".into(), Value::Bool(checked));
		}

		let mut rest = serde_json::Map::new();

		rest.insert("object".into(), Value::String("block".into()));
		rest.insert(kind.clone(), Value::Object(payload));

		Self { id: block.id.into(), kind, has_children: block.has_children, rest }
	}
}

/// Concatenates the plain text of every rich-text run.
///
/// Responses carry `plain_text` on every run; request-shaped runs only carry
/// `text.content`, which is used as the fallback.
pub fn flatten_rich_text(runs: &Value) -> String {
	let Some(runs) = runs.as_array() else {
		return String::new();
	};

	runs.iter()
		.filter_map(|run| {
			run.get("plain_text")
				.and_then(Value::as_str)
				.or_else(|| run.pointer("/text/content").and_then(Value::as_str))
		})
		.collect()
}

fn rich_text(text: &str) -> Value {
	let chars = text.chars().collect::<Vec<_>>();

	if chars.is_empty() {
		return json!([{ "type": "text", "text": { "content": "" } }]);
	}

	chars
		.chunks(RICH_TEXT_LIMIT)
		.map(|chunk| json!({ "type": "text", "text": { "content": chunk.iter().collect::<String>() } }))
		.collect()
}
