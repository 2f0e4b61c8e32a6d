use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::MbtCheckError;
use crate::MbtCheckResult;
use crate::config::CONFIG_FILE_CANDIDATES;
use crate::config::CheckConfig;
use crate::directive::Disposition;
use crate::directive::interpret;
use crate::group::CodeBlock;
use crate::group::GroupAccumulator;
use crate::group::GroupTable;
use crate::materialize::LITERATE_SUFFIX;
use crate::materialize::MaterializeOptions;
use crate::materialize::ProjectTree;
use crate::materialize::SOURCE_EXTENSION;
use crate::materialize::materialize;
use crate::materialize::prepare_output_root;
use crate::scanner::scan_fences;

/// Returns true if `path` names a literate MoonBit document.
pub fn is_literate_document(path: &Path) -> bool {
	path.file_name()
		.and_then(|name| name.to_str())
		.is_some_and(|name| name.ends_with(LITERATE_SUFFIX))
}

/// Keep only the literate documents of `paths`, in the given order.
pub fn select_documents(paths: &[PathBuf]) -> Vec<PathBuf> {
	paths
		.iter()
		.filter(|path| {
			let keep = is_literate_document(path);
			if !keep {
				tracing::warn!(path = %path.display(), "skipping file without `{LITERATE_SUFFIX}` suffix");
			}
			keep
		})
		.cloned()
		.collect()
}

/// List the supplementary sources of `dir`: direct child files with the
/// `.mbt` extension, sorted by path. Subdirectories are not traversed.
pub fn list_complementary(dir: &Path) -> MbtCheckResult<Vec<PathBuf>> {
	let to_error = |e: std::io::Error| {
		MbtCheckError::ComplementaryDir {
			path: dir.display().to_string(),
			reason: e.to_string(),
		}
	};

	let mut files = Vec::new();
	for entry in std::fs::read_dir(dir).map_err(to_error)? {
		let entry = entry.map_err(to_error)?;
		let path = entry.path();
		if !entry.file_type().map_err(to_error)?.is_file() {
			continue;
		}
		if path.extension().and_then(|ext| ext.to_str()) == Some(SOURCE_EXTENSION) {
			files.push(path);
		}
	}
	files.sort();

	Ok(files)
}

/// Apply directives to every MoonBit fence of one document and add the
/// surviving blocks to `groups`.
pub fn scan_document(
	document: &Path,
	content: &str,
	groups: &mut GroupAccumulator,
) -> MbtCheckResult<usize> {
	let mut kept = 0;

	for fence in scan_fences(content)? {
		let line = fence.span.map(|span| span.start);
		let Disposition::Keep {
			code,
			groups: keys,
			wrapped,
		} = interpret(&fence.body, fence.directive_tokens())
		else {
			tracing::debug!(document = %document.display(), ?line, "skipped fence");
			continue;
		};

		if keys.iter().any(String::is_empty) {
			tracing::warn!(
				document = %document.display(),
				?line,
				"`unless=` names an empty group key"
			);
		}

		let block = CodeBlock {
			source_file: document.to_path_buf(),
			code,
			span: fence.span,
			wrapped,
		};
		groups.push(&keys, &block);
		kept += 1;
	}

	Ok(kept)
}

/// Scan in-memory documents, in order, into a [`GroupTable`].
pub fn extract_sources<P, S>(sources: impl IntoIterator<Item = (P, S)>) -> MbtCheckResult<GroupTable>
where
	P: AsRef<Path>,
	S: AsRef<str>,
{
	let mut groups = GroupAccumulator::new();
	for (document, content) in sources {
		let kept = scan_document(document.as_ref(), content.as_ref(), &mut groups)?;
		tracing::debug!(document = %document.as_ref().display(), blocks = kept, "scanned document");
	}

	Ok(groups.finish())
}

/// Read and scan `documents`, in order, into a [`GroupTable`].
pub fn extract(documents: &[PathBuf]) -> MbtCheckResult<GroupTable> {
	let mut groups = GroupAccumulator::new();
	for document in documents {
		let content = std::fs::read_to_string(document).map_err(|e| {
			MbtCheckError::ReadDocument {
				path: document.display().to_string(),
				reason: e.to_string(),
			}
		})?;
		let kept = scan_document(document, &content, &mut groups)?;
		tracing::debug!(document = %document.display(), blocks = kept, "scanned document");
	}

	Ok(groups.finish())
}

/// Extract `documents` and write the resulting project to `output_root`.
///
/// Documents are scanned before the output root is touched, so a malformed
/// document leaves the previous output in place. The output root is then
/// cleared and every group written.
pub fn generate_project(
	documents: &[PathBuf],
	output_root: &Path,
	options: &MaterializeOptions,
) -> MbtCheckResult<(GroupTable, ProjectTree)> {
	let table = extract(documents)?;
	tracing::info!(
		documents = documents.len(),
		groups = table.len(),
		blocks = table.block_count(),
		"extracted code blocks"
	);

	prepare_output_root(output_root)?;
	let tree = materialize(&table, output_root, options)?;
	tracing::info!(root = %output_root.display(), "materialized project");

	Ok((table, tree))
}

/// Find every literate document below `root`.
///
/// Hidden directories, `target` and `node_modules` are skipped, as are paths
/// matched by the root `.gitignore` (unless disabled) or the configured
/// exclude patterns. With include patterns configured, only documents
/// matching one of them (relative to `root`) are kept. Subdirectories with
/// their own config file are separate projects and are not entered.
pub fn discover_documents(root: &Path, config: &CheckConfig) -> MbtCheckResult<Vec<PathBuf>> {
	let gitignore = if config.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(root)
	};
	let exclude = build_exclude_matcher(root, &config.exclude.patterns)?;
	let include = build_glob_set(&config.include.patterns)?;
	let output_root = root.join(&config.output_dir);

	let mut walker = DocumentWalker {
		gitignore: &gitignore,
		exclude: &exclude,
		output_root: &output_root,
		visited: HashSet::new(),
		files: Vec::new(),
	};
	walker.walk(root, true)?;

	let mut files = walker.files;
	if !include.is_empty() {
		files.retain(|path| {
			path.strip_prefix(root)
				.is_ok_and(|relative| include.is_match(relative))
		});
	}
	// Sort for deterministic ordering.
	files.sort();

	Ok(files)
}

struct DocumentWalker<'a> {
	gitignore: &'a Gitignore,
	exclude: &'a Gitignore,
	output_root: &'a Path,
	visited: HashSet<PathBuf>,
	files: Vec<PathBuf>,
}

impl DocumentWalker<'_> {
	fn walk(&mut self, dir: &Path, is_root: bool) -> MbtCheckResult<()> {
		if !dir.is_dir() {
			return Ok(());
		}

		// Detect symlink cycles by tracking canonical paths.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if !self.visited.insert(canonical) {
			return Err(MbtCheckError::SymlinkCycle {
				path: dir.display().to_string(),
			});
		}

		for entry in std::fs::read_dir(dir)? {
			let path = entry?.path();

			if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
				if is_ignored_directory_name(name) {
					continue;
				}
			}

			let is_dir = path.is_dir();
			if self.gitignore.matched(&path, is_dir).is_ignore()
				|| self.exclude.matched(&path, is_dir).is_ignore()
			{
				continue;
			}

			if is_dir {
				if path == self.output_root || (!is_root && has_project_config(&path)) {
					continue;
				}
				self.walk(&path, false)?;
			} else if is_literate_document(&path) {
				self.files.push(path);
			}
		}

		Ok(())
	}
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target"
}

fn has_project_config(dir: &Path) -> bool {
	CONFIG_FILE_CANDIDATES
		.iter()
		.any(|candidate| dir.join(candidate).is_file())
}

/// Build a `Gitignore` matcher from the project's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

/// Build a `Gitignore` matcher from `[exclude] patterns`.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> MbtCheckResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			MbtCheckError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
	}
	builder.build().map_err(|e| {
		MbtCheckError::InvalidPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

/// Build a `GlobSet` from `[include] patterns`.
fn build_glob_set(patterns: &[String]) -> MbtCheckResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = Glob::new(pattern).map_err(|e| {
			MbtCheckError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
		builder.add(glob);
	}
	builder.build().map_err(|e| {
		MbtCheckError::InvalidPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}
