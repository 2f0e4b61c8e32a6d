use std::path::Path;
use std::path::PathBuf;

use mbt_check_cli::extra_watch_dirs;
use mbt_check_cli::is_output_event;
use mbt_check_cli::resolve_program;
use mbt_check_core::AnyEmptyResult;
use similar_asserts::assert_eq;

#[test]
fn resolve_program_anchors_relative_paths() {
	let base = Path::new("/work/project");

	assert_eq!(resolve_program("./fake-moon", base), "/work/project/./fake-moon");
	assert_eq!(resolve_program("tools/moon", base), "/work/project/tools/moon");
	assert_eq!(resolve_program("moon", base), "moon");
	assert_eq!(resolve_program("/usr/bin/moon", base), "/usr/bin/moon");
}

#[test]
fn extra_watch_dirs_cover_documents_outside_root() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path().join("project");
	let shared = tmp.path().join("shared");
	let support = tmp.path().join("support");

	let dirs = extra_watch_dirs(
		&root,
		&[
			root.join("docs/a.mbt.md"),
			shared.join("b.mbt.md"),
			shared.join("c.mbt.md"),
		],
		Some(&support),
	)?;

	assert_eq!(dirs, vec![shared, support]);

	Ok(())
}

#[test]
fn extra_watch_dirs_skip_complementary_inside_root() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path().join("project");

	let dirs = extra_watch_dirs(&root, &[], Some(&root.join("support")))?;

	assert_eq!(dirs, Vec::<PathBuf>::new());

	Ok(())
}

#[test]
fn output_events_match_before_and_after_first_run() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let output_root = tmp.path().join("target/moonbit-check");
	let generated = vec![output_root.join("_/a.md.mbt")];
	let document = vec![tmp.path().join("a.mbt.md")];

	assert!(is_output_event(&generated, &output_root));
	assert!(!is_output_event(&document, &output_root));
	assert!(!is_output_event(&[], &output_root));

	std::fs::create_dir_all(&output_root)?;
	let canonical = output_root.canonicalize()?;

	assert!(is_output_event(&[canonical.join("_/a.md.mbt")], &output_root));
	assert!(!is_output_event(
		&[generated[0].clone(), document[0].clone()],
		&output_root
	));

	Ok(())
}
