use std::ops::ControlFlow;

use crate::group::BASELINE_GROUP;

/// A single info-string directive following the language tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Directive<'a> {
	/// `skip` or `no-check`: the block takes part in no group.
	Skip,
	/// `test`: wrap the block in a `test { ... }` unit.
	Test,
	/// `unless=a,b`: the block belongs to exactly these groups.
	Unless(Vec<&'a str>),
	/// Anything else. Ignored so new directives can be added without
	/// breaking older documents.
	Unknown(&'a str),
}

impl<'a> Directive<'a> {
	pub fn parse(token: &'a str) -> Self {
		match token {
			"skip" | "no-check" => Self::Skip,
			"test" => Self::Test,
			_ => {
				match token.strip_prefix("unless=") {
					Some(tags) => Self::Unless(tags.split(',').collect()),
					None => Self::Unknown(token),
				}
			}
		}
	}
}

/// What happens to a fence once all its directives are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
	/// The block is dropped entirely.
	Discard,
	/// The block is kept with its final code and target groups.
	Keep {
		/// The block body, wrapped in a test unit when `wrapped` is set.
		code: String,
		/// Non-empty, ordered, duplicate-free group keys.
		groups: Vec<String>,
		/// Whether the `test` wrap was applied.
		wrapped: bool,
	},
}

impl Disposition {
	pub fn is_discard(&self) -> bool {
		matches!(self, Self::Discard)
	}
}

#[derive(Debug, Default)]
struct Pending<'a> {
	groups: Option<Vec<&'a str>>,
	test: bool,
}

/// Fold the directive tokens of a fence into its [`Disposition`].
///
/// The first `skip`/`no-check` ends the fold and discards the block. The last
/// `unless=` decides the groups. `test` wraps the original body once, however
/// often it appears.
pub fn interpret<'a>(body: &str, tokens: impl IntoIterator<Item = &'a str>) -> Disposition {
	let folded = tokens
		.into_iter()
		.map(Directive::parse)
		.try_fold(Pending::default(), |mut pending, directive| {
			match directive {
				Directive::Skip => return ControlFlow::Break(()),
				Directive::Test => pending.test = true,
				Directive::Unless(tags) => pending.groups = Some(tags),
				Directive::Unknown(_) => {}
			}
			ControlFlow::Continue(pending)
		});

	let ControlFlow::Continue(pending) = folded else {
		return Disposition::Discard;
	};

	let mut groups: Vec<String> = Vec::new();
	for tag in pending.groups.unwrap_or_else(|| vec![BASELINE_GROUP]) {
		if !groups.iter().any(|existing| existing == tag) {
			groups.push(tag.to_string());
		}
	}

	let code = if pending.test {
		wrap_test(body)
	} else {
		body.to_string()
	};

	Disposition::Keep {
		code,
		groups,
		wrapped: pending.test,
	}
}

/// Wrap a snippet into a MoonBit test block, indenting every line by two
/// spaces.
pub fn wrap_test(code: &str) -> String {
	let indented: Vec<String> = code.split('\n').map(|line| format!("  {line}")).collect();
	format!("test {{\n{}\n}}", indented.join("\n"))
}
