use std::collections::BTreeMap;
use std::path::PathBuf;

use derive_more::Deref;
use serde::Deserialize;
use serde::Serialize;

use crate::scanner::LineSpan;

/// The reserved group whose blocks are included in every other group.
pub const BASELINE_GROUP: &str = "_";

/// A code block extracted from a literate document, after directives have
/// been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
	/// The document the block came from, as it was passed in.
	pub source_file: PathBuf,
	/// The block body, possibly wrapped in a `test { ... }` unit.
	pub code: String,
	/// Position of the fence in `source_file`, when known.
	pub span: Option<LineSpan>,
	/// Whether `code` was wrapped by the `test` directive.
	pub wrapped: bool,
}

impl CodeBlock {
	/// The `file:line:col` location written above the block in generated
	/// sources.
	pub fn location(&self) -> String {
		match self.span {
			Some(span) => format!("{}:{}:1", self.source_file.display(), span.start),
			None => self.source_file.display().to_string(),
		}
	}
}

/// Collects blocks per group key while documents are scanned.
///
/// Call [`GroupAccumulator::finish`] once scanning is complete to obtain the
/// read-only [`GroupTable`].
#[derive(Debug, Default)]
pub struct GroupAccumulator {
	groups: BTreeMap<String, Vec<CodeBlock>>,
}

impl GroupAccumulator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append `block` to every group in `keys`, creating groups on first use.
	pub fn push(&mut self, keys: &[String], block: &CodeBlock) {
		for key in keys {
			self.groups
				.entry(key.clone())
				.or_default()
				.push(block.clone());
		}
	}

	pub fn finish(self) -> GroupTable {
		GroupTable {
			groups: self.groups,
		}
	}
}

/// Blocks keyed by group, in scan order within each group. Keys iterate in
/// sorted order.
///
/// The table stores only the blocks each group was declared with. Baseline
/// inclusion is resolved by [`GroupTable::effective`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct GroupTable {
	groups: BTreeMap<String, Vec<CodeBlock>>,
}

impl GroupTable {
	/// The declared blocks of the baseline group.
	pub fn baseline(&self) -> &[CodeBlock] {
		self.groups
			.get(BASELINE_GROUP)
			.map_or(&[][..], Vec::as_slice)
	}

	/// The blocks materialized for `key`: the group's own blocks followed by
	/// the baseline blocks. The baseline group itself is returned as is.
	pub fn effective(&self, key: &str) -> Vec<&CodeBlock> {
		let own = self.groups.get(key).map_or(&[][..], Vec::as_slice);
		if key == BASELINE_GROUP {
			return own.iter().collect();
		}

		own.iter().chain(self.baseline()).collect()
	}

	/// Every group key paired with its effective blocks.
	pub fn effective_groups(&self) -> impl Iterator<Item = (&str, Vec<&CodeBlock>)> {
		self.groups
			.keys()
			.map(|key| (key.as_str(), self.effective(key)))
	}

	/// Total number of declared blocks across all groups.
	pub fn block_count(&self) -> usize {
		self.groups.values().map(Vec::len).sum()
	}
}
