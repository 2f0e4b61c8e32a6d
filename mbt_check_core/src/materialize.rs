use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::MbtCheckError;
use crate::MbtCheckResult;
use crate::config::DEFAULT_WARN_LIST;
use crate::config::ModuleConfig;
use crate::group::BASELINE_GROUP;
use crate::group::CodeBlock;
use crate::group::GroupTable;
use crate::source_map::Segment;
use crate::source_map::SourceMap;

/// Suffix of literate MoonBit documents.
pub const LITERATE_SUFFIX: &str = ".mbt.md";

/// Extension of hand-written MoonBit sources.
pub const SOURCE_EXTENSION: &str = "mbt";

/// Suffix of generated sources. The extra `.md` segment keeps them from
/// colliding with a supplementary file of the same stem.
pub const GENERATED_SUFFIX: &str = ".md.mbt";

/// File name of the per-group package descriptor.
pub const PACKAGE_FILE: &str = "moon.pkg.json";

/// File name of the root module manifest.
pub const MODULE_FILE: &str = "moon.mod.json";

/// Options controlling how groups are written to disk.
#[derive(Debug, Clone)]
pub struct MaterializeOptions {
	/// `warn-list` value of every package descriptor.
	pub warn_list: String,
	/// Metadata of the root module manifest.
	pub module: ModuleConfig,
	/// Supplementary `*.mbt` files eligible for copying into groups.
	pub complementary: Vec<PathBuf>,
}

impl Default for MaterializeOptions {
	fn default() -> Self {
		Self {
			warn_list: DEFAULT_WARN_LIST.to_string(),
			module: ModuleConfig::default(),
			complementary: Vec::new(),
		}
	}
}

#[derive(Debug, Serialize)]
struct PackageDescriptor<'a> {
	#[serde(rename = "warn-list")]
	warn_list: &'a str,
}

#[derive(Debug, Serialize)]
struct ModuleManifest<'a> {
	name: &'a str,
	version: &'a str,
}

/// What was written for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
	/// The group key.
	pub key: String,
	/// The group's package directory.
	pub dir: PathBuf,
	/// Number of blocks written, baseline blocks included.
	pub block_count: usize,
	/// Generated source files, in the order they were first written.
	pub generated: Vec<PathBuf>,
	/// Supplementary files copied into the package.
	pub copied: Vec<PathBuf>,
}

/// The result of writing a [`GroupTable`] to disk.
#[derive(Debug, Clone)]
pub struct ProjectTree {
	/// The output root holding `moon.mod.json` and every group package.
	pub root: PathBuf,
	/// One summary per group, in key order.
	pub groups: Vec<GroupSummary>,
	/// Maps generated lines back to their documents.
	pub source_map: SourceMap,
}

/// Remove any previous output at `root` and recreate it empty.
///
/// A missing directory is not an error. Any other failure to remove it is.
pub fn prepare_output_root(root: &Path) -> MbtCheckResult<()> {
	match std::fs::remove_dir_all(root) {
		Ok(()) => tracing::debug!(path = %root.display(), "cleared previous output"),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
		Err(e) => {
			return Err(MbtCheckError::ClearOutput {
				path: root.display().to_string(),
				reason: e.to_string(),
			});
		}
	}

	std::fs::create_dir_all(root).map_err(|e| materialize_error(root, &e))
}

/// The generated file name for a document: `intro.mbt.md` → `intro.md.mbt`.
pub fn generated_file_name(document: &Path) -> String {
	let name = document
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_default();
	let stem = name.strip_suffix(LITERATE_SUFFIX).unwrap_or(&name);
	format!("{stem}{GENERATED_SUFFIX}")
}

/// The stem a supplementary file is matched against group keys with:
/// `gpu.mbt` → `gpu`.
pub fn supplementary_stem(file: &Path) -> Option<String> {
	let name = file.file_name()?.to_string_lossy();
	name.strip_suffix(&format!(".{SOURCE_EXTENSION}"))
		.map(ToString::to_string)
}

/// Write every group of `table` below `root`, then the root module manifest.
///
/// Groups are written one after the other in key order. The first filesystem
/// error aborts the whole run.
pub fn materialize(
	table: &GroupTable,
	root: &Path,
	options: &MaterializeOptions,
) -> MbtCheckResult<ProjectTree> {
	let mut source_map = SourceMap::for_root(root);
	let mut groups = Vec::with_capacity(table.len());

	for (key, blocks) in table.effective_groups() {
		let summary = materialize_group(root, key, &blocks, options, &mut source_map)?;
		tracing::debug!(
			group = key,
			blocks = summary.block_count,
			files = summary.generated.len(),
			copied = summary.copied.len(),
			"materialized group"
		);
		groups.push(summary);
	}

	let manifest = ModuleManifest {
		name: &options.module.name,
		version: &options.module.version,
	};
	write_json(&root.join(MODULE_FILE), &manifest)?;

	Ok(ProjectTree {
		root: root.to_path_buf(),
		groups,
		source_map,
	})
}

fn materialize_group(
	root: &Path,
	key: &str,
	blocks: &[&CodeBlock],
	options: &MaterializeOptions,
	source_map: &mut SourceMap,
) -> MbtCheckResult<GroupSummary> {
	if key.is_empty() {
		tracing::warn!("materializing the empty group key into the output root itself");
	}

	let dir = group_dir(root, key)?;
	std::fs::create_dir_all(&dir).map_err(|e| materialize_error(&dir, &e))?;

	// Lines already written to each generated file of this group.
	let mut written: BTreeMap<String, usize> = BTreeMap::new();
	let mut generated = Vec::new();

	for block in blocks {
		let file_name = generated_file_name(&block.source_file);
		let path = dir.join(&file_name);
		let lines_before = match written.get(&file_name) {
			Some(lines) => *lines,
			None => {
				generated.push(path.clone());
				0
			}
		};

		append_block(&path, block)?;

		let code_lines = block.code.split('\n').count();
		if let Some(span) = block.span {
			let (source_start, column_shift) = if block.wrapped {
				(span.start, 2)
			} else {
				(span.start + 1, 0)
			};
			source_map.record(Segment {
				group: key.to_string(),
				file_name: file_name.clone(),
				output_start: lines_before + 2,
				output_end: lines_before + 1 + code_lines,
				source_file: block.source_file.clone(),
				source_start,
				column_shift,
			});
		}

		written.insert(file_name, lines_before + code_lines + 2);
	}

	let descriptor = PackageDescriptor {
		warn_list: &options.warn_list,
	};
	write_json(&dir.join(PACKAGE_FILE), &descriptor)?;

	let mut copied = Vec::new();
	for file in &options.complementary {
		let Some(stem) = supplementary_stem(file) else {
			continue;
		};
		if stem != key && stem != BASELINE_GROUP {
			continue;
		}
		let Some(name) = file.file_name() else {
			continue;
		};
		let target = dir.join(name);
		std::fs::copy(file, &target).map_err(|e| materialize_error(&target, &e))?;
		copied.push(target);
	}

	Ok(GroupSummary {
		key: key.to_string(),
		dir,
		block_count: blocks.len(),
		generated,
		copied,
	})
}

/// The package directory of `key` below `root`. Keys must stay inside the
/// output root: absolute keys and keys with `.` or `..` components are
/// rejected. The empty key names the root itself.
fn group_dir(root: &Path, key: &str) -> MbtCheckResult<PathBuf> {
	let stays_inside = Path::new(key)
		.components()
		.all(|component| matches!(component, Component::Normal(_)));
	if !stays_inside {
		return Err(MbtCheckError::Materialize {
			path: root.join(key).display().to_string(),
			reason: format!("group key `{key}` does not name a directory inside the output root"),
		});
	}

	Ok(root.join(key))
}

/// Append a block to `path`: its location comment, its code and a blank line.
fn append_block(path: &Path, block: &CodeBlock) -> MbtCheckResult<()> {
	let mut file = OpenOptions::new()
		.create(true)
		.append(true)
		.open(path)
		.map_err(|e| materialize_error(path, &e))?;
	let content = format!("// {}\n{}\n\n", block.location(), block.code);
	file.write_all(content.as_bytes())
		.map_err(|e| materialize_error(path, &e))
}

fn write_json(path: &Path, value: &impl Serialize) -> MbtCheckResult<()> {
	let payload = serde_json::to_string_pretty(value).map_err(|e| {
		MbtCheckError::Serialize {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})?;
	std::fs::write(path, payload).map_err(|e| materialize_error(path, &e))
}

fn materialize_error(path: &Path, error: &std::io::Error) -> MbtCheckError {
	MbtCheckError::Materialize {
		path: path.display().to_string(),
		reason: error.to_string(),
	}
}
