use markdown::ParseOptions;
use markdown::mdast::Code;
use markdown::mdast::Node;
use markdown::to_mdast;
use serde::Deserialize;
use serde::Serialize;

use crate::MbtCheckError;
use crate::MbtCheckResult;

/// Info-string language tags recognized as MoonBit, compared
/// case-insensitively against the first info-string token.
pub const LANGUAGE_TAGS: [&str; 2] = ["moonbit", "mbt"];

/// 1-indexed lines of a fence's opening and closing delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
	pub start: usize,
	pub end: usize,
}

/// A fenced code block whose info-string names MoonBit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fence {
	/// The trimmed info-string, e.g. `mbt test unless=js`.
	pub info: String,
	/// The raw body between the delimiters, without the final newline.
	pub body: String,
	/// Where the fence sits in its document, when the parser reports it.
	pub span: Option<LineSpan>,
}

impl Fence {
	/// The info-string tokens after the language tag.
	pub fn directive_tokens(&self) -> impl Iterator<Item = &str> {
		self.info.split_whitespace().skip(1)
	}
}

/// Returns true when the first whitespace-delimited token of `info` is one of
/// [`LANGUAGE_TAGS`]. `mbtx` or `moonbitlang` do not match.
pub fn is_moonbit_info(info: &str) -> bool {
	info.split_whitespace().next().is_some_and(|tag| {
		LANGUAGE_TAGS
			.iter()
			.any(|candidate| tag.eq_ignore_ascii_case(candidate))
	})
}

/// Parse markdown content and return every MoonBit fence in document order.
///
/// Fences nested inside block quotes, list items or other containers are
/// found by walking the whole tree. Indented code blocks carry no info-string
/// and never match.
pub fn scan_fences(content: impl AsRef<str>) -> MbtCheckResult<Vec<Fence>> {
	let content = normalize_line_endings(content.as_ref());
	let options = ParseOptions::gfm();
	let mdast = to_mdast(&content, &options).map_err(|e| MbtCheckError::Markdown(e.to_string()))?;
	let mut fences = vec![];
	collect_fences(&mdast, &mut fences);

	Ok(fences)
}

fn collect_fences(node: &Node, fences: &mut Vec<Fence>) {
	match node {
		Node::Code(code) => {
			if let Some(fence) = fence_from_code(code) {
				fences.push(fence);
			}
		}
		_ => {
			if let Some(children) = node.children() {
				for child in children {
					collect_fences(child, fences);
				}
			}
		}
	}
}

fn fence_from_code(code: &Code) -> Option<Fence> {
	let lang = code.lang.as_deref()?;
	let info = match code.meta.as_deref().map(str::trim) {
		Some(meta) if !meta.is_empty() => format!("{} {meta}", lang.trim()),
		_ => lang.trim().to_string(),
	};

	if !is_moonbit_info(&info) {
		return None;
	}

	let span = code.position.as_ref().map(|position| {
		LineSpan {
			start: position.start.line,
			end: position.end.line,
		}
	});

	Some(Fence {
		info,
		body: code.value.clone(),
		span,
	})
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}
