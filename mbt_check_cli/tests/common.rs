#![allow(dead_code)]

use std::path::Path;
use std::path::PathBuf;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub const DOC_A: &str = "# A\n\n```mbt\nx()\n```\n";

pub const DOC_B: &str = "# B\n\n```mbt unless=gpu\ny()\n```\n\n```mbt test\nz()\n```\n";

pub fn mbt_check_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("mbt-check"));
	cmd.env("NO_COLOR", "1")
		.env_remove("MBT_CHECK_MOON")
		.env_remove("RUST_LOG");
	cmd
}

/// Write `a.mbt.md` and `b.mbt.md` into `dir` and return their paths.
pub fn write_documents(dir: &Path) -> std::io::Result<(PathBuf, PathBuf)> {
	std::fs::create_dir_all(dir)?;
	let a = dir.join("a.mbt.md");
	let b = dir.join("b.mbt.md");
	std::fs::write(&a, DOC_A)?;
	std::fs::write(&b, DOC_B)?;
	Ok((a, b))
}

/// Write an executable shell script standing in for `moon`. The subcommand
/// is available as `$1` and the working directory is the generated project.
#[cfg(unix)]
pub fn fake_moon(dir: &Path, body: &str) -> std::io::Result<PathBuf> {
	use std::os::unix::fs::PermissionsExt;

	let path = dir.join("fake-moon");
	std::fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
	let mut permissions = std::fs::metadata(&path)?.permissions();
	permissions.set_mode(0o755);
	std::fs::set_permissions(&path, permissions)?;
	Ok(path)
}
