use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MbtCheckError {
	#[error(transparent)]
	#[diagnostic(code(mbt_check::io_error))]
	Io(#[from] std::io::Error),

	#[error("failure to load markdown: {0}")]
	#[diagnostic(code(mbt_check::markdown))]
	Markdown(String),

	#[error("failed to read document `{path}`: {reason}")]
	#[diagnostic(code(mbt_check::read_document))]
	ReadDocument { path: String, reason: String },

	#[error("failed to clear output directory `{path}`: {reason}")]
	#[diagnostic(
		code(mbt_check::clear_output),
		help("remove the directory manually or choose another `--output` location")
	)]
	ClearOutput { path: String, reason: String },

	#[error("failed to materialize `{path}`: {reason}")]
	#[diagnostic(code(mbt_check::materialize))]
	Materialize { path: String, reason: String },

	#[error("failed to read complementary directory `{path}`: {reason}")]
	#[diagnostic(
		code(mbt_check::complementary_dir),
		help("`--complementary` must point to a readable directory of `*.mbt` files")
	)]
	ComplementaryDir { path: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mbt_check::config_parse),
		help("check that mbt-check.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("invalid pattern `{pattern}`: {reason}")]
	#[diagnostic(
		code(mbt_check::invalid_pattern),
		help("include patterns use glob syntax, exclude patterns use gitignore syntax")
	)]
	InvalidPattern { pattern: String, reason: String },

	#[error("failed to serialize `{path}`: {reason}")]
	#[diagnostic(code(mbt_check::serialize))]
	Serialize { path: String, reason: String },

	#[error("failed to run `{program} {subcommand}`: {reason}")]
	#[diagnostic(
		code(mbt_check::tool_spawn),
		help("make sure the moon toolchain is installed or pass `--moon <path>`")
	)]
	ToolSpawn {
		program: String,
		subcommand: String,
		reason: String,
	},

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(mbt_check::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },
}

pub type MbtCheckResult<T> = Result<T, MbtCheckError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
