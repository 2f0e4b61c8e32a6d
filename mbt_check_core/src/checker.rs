use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use crate::MbtCheckError;
use crate::MbtCheckResult;
use crate::config::DEFAULT_MOON;

/// A subcommand of the external toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
	Check,
	Test,
}

impl std::fmt::Display for Subcommand {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Check => write!(f, "check"),
			Self::Test => write!(f, "test"),
		}
	}
}

/// Captured result of one toolchain invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
	pub subcommand: Subcommand,
	/// The exit code, or `None` when the process was killed by a signal.
	pub code: Option<i32>,
	pub stdout: String,
	pub stderr: String,
}

impl ToolOutput {
	pub fn success(&self) -> bool {
		self.code == Some(0)
	}
}

/// Result of checking (and optionally testing) a generated project.
#[derive(Debug, Clone)]
pub struct CheckReport {
	pub check: ToolOutput,
	/// Present when tests were requested and the check passed.
	pub test: Option<ToolOutput>,
}

impl CheckReport {
	/// Returns true if every invoked subcommand exited successfully.
	pub fn is_ok(&self) -> bool {
		self.check.success() && self.test.as_ref().is_none_or(ToolOutput::success)
	}

	/// The first invocation that failed, if any.
	pub fn failure(&self) -> Option<&ToolOutput> {
		if !self.check.success() {
			return Some(&self.check);
		}
		self.test.as_ref().filter(|test| !test.success())
	}
}

/// Drives the external toolchain against a generated project root.
#[derive(Debug, Clone)]
pub struct Checker {
	program: String,
	root: PathBuf,
}

impl Checker {
	pub fn new(program: impl Into<String>, root: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
			root: root.into(),
		}
	}

	/// A checker using the default `moon` executable.
	pub fn moon(root: impl Into<PathBuf>) -> Self {
		Self::new(DEFAULT_MOON, root)
	}

	pub fn program(&self) -> &str {
		&self.program
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Run a single subcommand with the project root as working directory.
	///
	/// A non-zero exit is reported through [`ToolOutput::code`]. Only a
	/// failure to launch the program is an error.
	pub fn run(&self, subcommand: Subcommand) -> MbtCheckResult<ToolOutput> {
		tracing::info!(program = %self.program, %subcommand, root = %self.root.display(), "running toolchain");
		let output = Command::new(&self.program)
			.arg(subcommand.to_string())
			.current_dir(&self.root)
			.output()
			.map_err(|e| {
				MbtCheckError::ToolSpawn {
					program: self.program.clone(),
					subcommand: subcommand.to_string(),
					reason: e.to_string(),
				}
			})?;

		let result = ToolOutput {
			subcommand,
			code: output.status.code(),
			stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
			stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
		};
		tracing::debug!(%subcommand, code = ?result.code, "toolchain finished");

		Ok(result)
	}

	/// Run `check`, then `test` when `run_tests` is set and the check passed.
	pub fn check(&self, run_tests: bool) -> MbtCheckResult<CheckReport> {
		let check = self.run(Subcommand::Check)?;
		let test = if run_tests && check.success() {
			Some(self.run(Subcommand::Test)?)
		} else {
			None
		};

		Ok(CheckReport { check, test })
	}
}
