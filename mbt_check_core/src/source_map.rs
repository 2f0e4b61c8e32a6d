use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::materialize::GENERATED_SUFFIX;

/// A run of lines in a generated file that came from one code block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
	/// The group directory the generated file lives in.
	pub group: String,
	/// File name of the generated file, e.g. `intro.md.mbt`.
	pub file_name: String,
	/// First generated line of the block's code (1-indexed).
	pub output_start: usize,
	/// Last generated line of the block's code (1-indexed, inclusive).
	pub output_end: usize,
	/// The document the block came from.
	pub source_file: PathBuf,
	/// Document line corresponding to `output_start`.
	pub source_start: usize,
	/// Columns added in front of every generated line (the `test` wrap
	/// indentation).
	pub column_shift: usize,
}

impl Segment {
	fn contains(&self, group: &str, file_name: &str, line: usize) -> bool {
		self.group == group
			&& self.file_name == file_name
			&& (self.output_start..=self.output_end).contains(&line)
	}

	fn map(&self, line: usize, column: usize) -> (usize, usize) {
		let source_line = self.source_start + (line - self.output_start);
		let source_column = column.saturating_sub(self.column_shift).max(1);
		(source_line, source_column)
	}
}

/// Maps locations in the generated project back to the literate documents
/// they were extracted from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMap {
	segments: Vec<Segment>,
	/// Directory name of the output root. Files of the empty group key sit
	/// directly in the root, so this name stands for the key `""`.
	#[serde(default)]
	root_name: Option<String>,
}

impl SourceMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// An empty map for a project written to `root`.
	pub fn for_root(root: &Path) -> Self {
		let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
		Self {
			segments: Vec::new(),
			root_name: root
				.file_name()
				.map(|name| name.to_string_lossy().into_owned()),
		}
	}

	pub fn record(&mut self, segment: Segment) {
		self.segments.push(segment);
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	pub fn is_empty(&self) -> bool {
		self.segments.is_empty()
	}

	/// Resolve a generated location to `(document, line, column)`.
	pub fn resolve(
		&self,
		group: &str,
		file_name: &str,
		line: usize,
		column: usize,
	) -> Option<(&PathBuf, usize, usize)> {
		let segment = self
			.segments
			.iter()
			.find(|segment| segment.contains(group, file_name, line))?;
		let (line, column) = segment.map(line, column);
		Some((&segment.source_file, line, column))
	}

	/// Rewrite every `<group>/<stem>.md.mbt:<line>:<col>` location in `text`
	/// into the document location it came from. A trailing `-<line>:<col>`
	/// range end is rewritten too. Locations outside any recorded block are
	/// left unchanged.
	pub fn rewrite(&self, text: &str) -> String {
		if self.segments.is_empty() {
			return text.to_string();
		}

		let marker = format!("{GENERATED_SUFFIX}:");
		let mut output = String::with_capacity(text.len());
		let mut rest = text;

		while let Some(index) = rest.find(&marker) {
			let path_end = index + GENERATED_SUFFIX.len();
			let path_start = rest[..index]
				.char_indices()
				.rev()
				.find(|(_, c)| is_path_delimiter(*c))
				.map_or(0, |(i, c)| i + c.len_utf8());
			let path = &rest[path_start..path_end];
			let after = &rest[path_end + 1..];

			let Some(location) = parse_location(after) else {
				output.push_str(&rest[..path_end + 1]);
				rest = after;
				continue;
			};

			match self.rewrite_location(path, &location) {
				Some(replacement) => {
					output.push_str(&rest[..path_start]);
					output.push_str(&replacement);
				}
				None => output.push_str(&rest[..path_end + 1 + location.consumed]),
			}
			rest = &after[location.consumed..];
		}

		output.push_str(rest);
		output
	}

	fn rewrite_location(&self, path: &str, location: &Location) -> Option<String> {
		let normalized = path.replace('\\', "/");
		let mut components = normalized.rsplit('/');
		let file_name = components.next()?;
		let group = components.next().unwrap_or_default();

		let group = self.group_of(group, file_name, location.line);

		let (source, line, column) =
			self.resolve(group, file_name, location.line, location.column.unwrap_or(1))?;
		let mut replacement = match location.column {
			Some(_) => format!("{}:{line}:{column}", source.display()),
			None => format!("{}:{line}", source.display()),
		};

		if let Some((end_line, end_column)) = location.end {
			let (end_line, end_column) = self
				.resolve(group, file_name, end_line, end_column)
				.map_or((end_line, end_column), |(_, line, column)| (line, column));
			replacement.push_str(&format!("-{end_line}:{end_column}"));
		}

		Some(replacement)
	}

	/// The group of a generated file reported in the directory `parent`.
	/// Files of the empty key sit directly in the output root.
	fn group_of<'a>(&self, parent: &'a str, file_name: &str, line: usize) -> &'a str {
		let is_root = self.root_name.as_deref() == Some(parent);
		let known = self
			.segments
			.iter()
			.any(|segment| segment.contains(parent, file_name, line));
		if is_root && !known { "" } else { parent }
	}
}

fn is_path_delimiter(c: char) -> bool {
	c.is_whitespace() || matches!(c, '[' | '(' | '<' | '"' | '\'' | '`')
}

/// A parsed `line[:col][-line:col]` suffix.
struct Location {
	line: usize,
	column: Option<usize>,
	end: Option<(usize, usize)>,
	consumed: usize,
}

fn take_number(input: &str) -> Option<(usize, usize)> {
	let digits = input.bytes().take_while(u8::is_ascii_digit).count();
	if digits == 0 {
		return None;
	}
	input[..digits].parse().ok().map(|n| (n, digits))
}

fn parse_location(input: &str) -> Option<Location> {
	let (line, mut consumed) = take_number(input)?;
	let mut column = None;
	let mut end = None;

	if let Some(rest) = input[consumed..].strip_prefix(':') {
		if let Some((col, len)) = take_number(rest) {
			column = Some(col);
			consumed += 1 + len;
		}
	}

	if column.is_some() {
		if let Some(rest) = input[consumed..].strip_prefix('-') {
			if let Some((end_line, line_len)) = take_number(rest) {
				if let Some(after_line) = rest[line_len..].strip_prefix(':') {
					if let Some((end_column, column_len)) = take_number(after_line) {
						end = Some((end_line, end_column));
						consumed += 1 + line_len + 1 + column_len;
					}
				}
			}
		}
	}

	Some(Location {
		line,
		column,
		end,
		consumed,
	})
}
