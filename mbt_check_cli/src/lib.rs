use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::path::absolute;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Check that the MoonBit samples of literate markdown documents compile.",
	long_about = "mbt-check extracts the MoonBit code fences of literate documents \
	              (`*.mbt.md`), groups them by their `unless=` tags, writes one package per \
	              group into a temporary moon module and runs `moon check` on it.\n\nFence \
	              directives:\n  mbt             Part of the baseline group `_`\n  mbt test        \
	              Wrapped in a `test { ... }` block\n  mbt unless=a,b  Only in groups `a` and \
	              `b` (plus the baseline)\n  mbt skip        Never extracted (also `no-check`)"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct MbtCheckCli {
	/// Literate documents to check. Files without the `.mbt.md` suffix are
	/// skipped. When omitted, documents are discovered below the project
	/// root.
	pub files: Vec<PathBuf>,

	/// Run `moon test` after a successful `moon check`.
	#[arg(long, default_value_t = false)]
	pub test: bool,

	/// Directory of supplementary `*.mbt` files. `<group>.mbt` is copied into
	/// the matching group and `_.mbt` into every group.
	#[arg(long, value_name = "DIR")]
	pub complementary: Option<PathBuf>,

	/// Path to the project root directory.
	#[arg(long, short)]
	pub path: Option<PathBuf>,

	/// Directory the generated project is written to. Cleared before every
	/// run. Defaults to `target/moonbit-check` below the project root.
	#[arg(long, short, value_name = "DIR")]
	pub output: Option<PathBuf>,

	/// The moon executable used to check the generated project.
	#[arg(long, env = "MBT_CHECK_MOON", value_name = "PROGRAM")]
	pub moon: Option<String>,

	/// Write the generated project and stop without running moon.
	#[arg(long, default_value_t = false)]
	pub extract_only: bool,

	/// Relay moon's output as is, without mapping generated locations back
	/// to the documents.
	#[arg(long, default_value_t = false)]
	pub raw_diagnostics: bool,

	/// Watch for document changes and re-run the check automatically.
	#[arg(long, default_value_t = false)]
	pub watch: bool,

	/// Enable verbose output.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}

impl MbtCheckCli {
	/// The default log filter when `RUST_LOG` is unset.
	pub fn log_filter(&self) -> &'static str {
		if self.verbose { "info" } else { "warn" }
	}
}

/// Resolve a checker program against `base` when it is a relative path with
/// more than one component (`./tools/moon`, `bin/moon`). Bare names are left
/// for the `PATH` lookup.
///
/// The checker runs inside the generated project, so a relative path has to
/// be anchored before it is spawned.
pub fn resolve_program(program: &str, base: &Path) -> String {
	let path = Path::new(program);
	if path.is_relative() && path.components().count() > 1 {
		base.join(path).display().to_string()
	} else {
		program.to_string()
	}
}

/// Directories watched non-recursively next to the recursive project root:
/// the parents of explicit documents and the complementary directory, when
/// they lie outside `root`. All paths are absolute and deduplicated.
pub fn extra_watch_dirs(
	root: &Path,
	documents: &[PathBuf],
	complementary: Option<&Path>,
) -> io::Result<Vec<PathBuf>> {
	let root = absolute(root)?;
	let mut dirs = BTreeSet::new();

	for document in documents {
		if let Some(parent) = absolute(document)?.parent() {
			dirs.insert(parent.to_path_buf());
		}
	}
	if let Some(dir) = complementary {
		dirs.insert(absolute(dir)?);
	}

	Ok(dirs
		.into_iter()
		.filter(|dir| !dir.starts_with(&root))
		.collect())
}

/// Returns true when every path of a watch event lies inside the output root.
/// The root is canonicalized on each call since it only exists once a run has
/// prepared it.
pub fn is_output_event(paths: &[PathBuf], output_root: &Path) -> bool {
	let canonical = output_root.canonicalize().ok();
	!paths.is_empty()
		&& paths.iter().all(|path| {
			path.starts_with(output_root)
				|| canonical
					.as_deref()
					.is_some_and(|canonical| path.starts_with(canonical))
		})
}
