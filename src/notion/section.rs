//! Section projection and anchor lookup over a block snapshot.
//!
//! Everything here is pure: the editor fetches a fresh block list, and these helpers compute
//! indices into it. A section starts at a heading of any level and runs up to, but excluding,
//! the next heading of any level or the end of the document.

// std
use std::ops::Range;
// self
use crate::{
	_prelude::*,
	notion::{Block, BlockId, BlockKind},
};

/// Which blocks an anchor may match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnchorKind {
	/// Only heading blocks.
	Heading,
	/// Any block whose flattened text equals the anchor.
	Text,
}
impl AnchorKind {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Heading => "heading",
			Self::Text => "text block",
		}
	}

	fn admits(self, block: &Block) -> bool {
		match self {
			Self::Heading => block.kind.is_heading(),
			Self::Text => true,
		}
	}
}
impl Display for AnchorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Resolution rule when several blocks carry the anchor text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnchorPolicy {
	/// Use the first match in document order.
	#[default]
	FirstMatch,
	/// Use the last match in document order.
	LastMatch,
	/// Fail with [`Error::AmbiguousAnchor`] when more than one block matches.
	Reject,
}
impl AnchorPolicy {
	/// Finds the block matching `anchor` exactly (case- and whitespace-sensitive).
	pub fn locate(self, blocks: &[Block], anchor: &str, kind: AnchorKind) -> AnchorLookup {
		let mut matches = blocks
			.iter()
			.enumerate()
			.filter(|(_, block)| kind.admits(block) && block.text == anchor)
			.map(|(index, _)| index);
		let Some(first) = matches.next() else {
			return AnchorLookup::Missing;
		};

		match self {
			Self::FirstMatch => AnchorLookup::Found(first),
			Self::LastMatch => AnchorLookup::Found(matches.last().unwrap_or(first)),
			Self::Reject => match matches.count() {
				0 => AnchorLookup::Found(first),
				others => AnchorLookup::Ambiguous(others + 1),
			},
		}
	}
}

/// Result of an anchor scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorLookup {
	/// Index of the selected block.
	Found(usize),
	/// No block matched.
	Missing,
	/// Several blocks matched under [`AnchorPolicy::Reject`].
	Ambiguous(usize),
}
impl AnchorLookup {
	/// Converts the lookup into an index or the matching crate error.
	pub fn into_result(self, document: &BlockId, anchor: &str, kind: AnchorKind) -> Result<usize> {
		match self {
			Self::Found(index) => Ok(index),
			Self::Missing => Err(Error::AnchorNotFound {
				document: document.clone(),
				anchor: anchor.to_owned(),
				kind,
			}),
			Self::Ambiguous(matches) => Err(Error::AmbiguousAnchor {
				document: document.clone(),
				anchor: anchor.to_owned(),
				kind,
				matches,
			}),
		}
	}
}

/// Stage of a section replacement, reported by [`Error::PartialSectionEdit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionEditStage {
	/// Deleting the old body blocks.
	Delete,
	/// Inserting the new body after the heading.
	Insert,
}
impl SectionEditStage {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Delete => "delete",
			Self::Insert => "insert",
		}
	}
}
impl Display for SectionEditStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One row of a section listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionEntry {
	/// 1-based heading ordinal; `0` is the preamble before the first heading.
	pub section: usize,
	/// Block type.
	#[serde(rename = "type")]
	pub kind: BlockKind,
	/// Flattened text.
	pub text: String,
	/// Block identifier.
	pub block_id: BlockId,
}

/// Lists every heading and every non-empty paragraph or list item with its section number.
pub fn read_sections(blocks: &[Block]) -> Vec<SectionEntry> {
	let mut section = 0;
	let mut entries = Vec::new();

	for block in blocks {
		if block.kind.is_heading() {
			section += 1;
		} else if !block.kind.is_text_bearing() || block.text.is_empty() {
			continue;
		}

		entries.push(SectionEntry {
			section,
			kind: block.kind.clone(),
			text: block.text.clone(),
			block_id: block.id.clone(),
		});
	}

	entries
}

/// Returns the body range of the section whose heading sits at `heading`.
///
/// The range starts right after the heading and ends before the next heading of any level,
/// or at the end of `blocks`.
pub fn section_body_range(blocks: &[Block], heading: usize) -> Range<usize> {
	let start = heading + 1;
	let end = blocks
		.iter()
		.skip(start)
		.position(|block| block.kind.is_heading())
		.map_or(blocks.len(), |offset| start + offset);

	start..end
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::notion::HeadingLevel;

	fn block(n: u8, kind: BlockKind, text: &str) -> Block {
		Block {
			id: BlockId::parse(format!("{n:032x}")).expect("Fixture id should parse."),
			kind,
			text: text.into(),
			language: None,
			icon: None,
			checked: None,
			has_children: false,
		}
	}

	fn h1(n: u8, text: &str) -> Block {
		block(n, BlockKind::Heading(HeadingLevel::One), text)
	}

	fn h2(n: u8, text: &str) -> Block {
		block(n, BlockKind::Heading(HeadingLevel::Two), text)
	}

	fn p(n: u8, text: &str) -> Block {
		block(n, BlockKind::Paragraph, text)
	}

	#[test]
	fn sections_are_numbered_by_heading_order() {
		let blocks = vec![
			h1(1, "A"),
			p(2, "x"),
			h2(3, "B"),
			block(4, BlockKind::BulletedItem, "y"),
			block(5, BlockKind::BulletedItem, "z"),
			h1(6, "C"),
		];
		let entries = read_sections(&blocks);
		let headings = entries
			.iter()
			.filter(|entry| entry.kind.is_heading())
			.map(|entry| (entry.section, entry.text.as_str()))
			.collect::<Vec<_>>();

		assert_eq!(headings, vec![(1, "A"), (2, "B"), (3, "C")]);
		assert_eq!(entries[1].section, 1);
		assert_eq!(entries[1].text, "x");
		assert_eq!(entries[3].section, 2);
		assert_eq!(entries[4].section, 2);
		assert_eq!(entries.len(), 6);
	}

	#[test]
	fn preamble_is_section_zero_and_empty_or_rich_blocks_are_skipped() {
		let blocks = vec![
			p(1, "intro"),
			p(2, ""),
			block(3, BlockKind::Divider, ""),
			block(4, BlockKind::Code, "fn main() {}"),
			h2(5, "Usage"),
		];
		let entries = read_sections(&blocks);

		assert_eq!(entries.len(), 2);
		assert_eq!((entries[0].section, entries[0].text.as_str()), (0, "intro"));
		assert_eq!((entries[1].section, entries[1].text.as_str()), (1, "Usage"));
	}

	#[test]
	fn body_range_stops_at_next_heading_of_any_level() {
		let blocks = vec![h2(1, "Target"), p(2, "old1"), p(3, "old2"), h1(4, "Next")];

		assert_eq!(section_body_range(&blocks, 0), 1..3);
	}

	#[test]
	fn body_range_runs_to_end_of_document() {
		let blocks = vec![p(1, "lead"), h2(2, "Target"), p(3, "old1")];

		assert_eq!(section_body_range(&blocks, 1), 2..3);

		let heading_only = vec![h2(1, "Target")];

		assert!(section_body_range(&heading_only, 0).is_empty());
	}

	#[test]
	fn anchors_match_exactly_and_respect_kind() {
		let blocks = vec![p(1, "Usage"), h2(2, "Usage"), p(3, "usage "), h2(4, "Next")];

		assert_eq!(
			AnchorPolicy::FirstMatch.locate(&blocks, "Usage", AnchorKind::Heading),
			AnchorLookup::Found(1)
		);
		assert_eq!(
			AnchorPolicy::FirstMatch.locate(&blocks, "Usage", AnchorKind::Text),
			AnchorLookup::Found(0)
		);
		assert_eq!(
			AnchorPolicy::FirstMatch.locate(&blocks, "usage", AnchorKind::Text),
			AnchorLookup::Missing
		);
	}

	#[test]
	fn duplicate_anchors_follow_policy() {
		let blocks = vec![h2(1, "Notes"), p(2, "a"), h2(3, "Notes"), p(4, "b"), h2(5, "Notes")];

		assert_eq!(
			AnchorPolicy::FirstMatch.locate(&blocks, "Notes", AnchorKind::Heading),
			AnchorLookup::Found(0)
		);
		assert_eq!(
			AnchorPolicy::LastMatch.locate(&blocks, "Notes", AnchorKind::Heading),
			AnchorLookup::Found(4)
		);
		assert_eq!(
			AnchorPolicy::Reject.locate(&blocks, "Notes", AnchorKind::Heading),
			AnchorLookup::Ambiguous(3)
		);
		assert_eq!(
			AnchorPolicy::Reject.locate(&blocks, "a", AnchorKind::Text),
			AnchorLookup::Found(1)
		);
	}

	#[test]
	fn lookups_convert_into_crate_errors() {
		let document = BlockId::parse(format!("{:032x}", 9)).expect("Fixture id should parse.");
		let err = AnchorLookup::Missing
			.into_result(&document, "Does Not Exist", AnchorKind::Text)
			.expect_err("Missing anchors should fail.");

		assert!(matches!(err, Error::AnchorNotFound { kind: AnchorKind::Text, .. }));

		let err = AnchorLookup::Ambiguous(2)
			.into_result(&document, "Notes", AnchorKind::Heading)
			.expect_err("Ambiguous anchors should fail.");

		assert!(matches!(err, Error::AmbiguousAnchor { matches: 2, .. }));
	}
}
