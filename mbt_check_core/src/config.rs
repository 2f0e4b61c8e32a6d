use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::MbtCheckError;
use crate::MbtCheckResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"mbt-check.toml",
	".mbt-check.toml",
	".config/mbt-check.toml",
];

/// Default output root, relative to the project root.
pub const DEFAULT_OUTPUT_DIR: &str = "target/moonbit-check";

/// Default checker executable.
pub const DEFAULT_MOON: &str = "moon";

/// Warning list written to every generated `moon.pkg.json`. Warning 15 is
/// demoted from an error while every other warning keeps its level.
pub const DEFAULT_WARN_LIST: &str = "-15+15";

/// Default `name` of the generated `moon.mod.json`.
pub const DEFAULT_MODULE_NAME: &str = "moonbit-check";

/// Default `version` of the generated `moon.mod.json`.
pub const DEFAULT_MODULE_VERSION: &str = "0.1.0";

/// Configuration loaded from an `mbt-check.toml` file.
///
/// ```toml
/// output_dir = "target/moonbit-check"
/// complementary = "docs/support"
/// test = true
/// moon = "moon"
/// warn_list = "-15+15"
///
/// [module]
/// name = "moonbit-check"
/// version = "0.1.0"
///
/// [include]
/// patterns = ["docs/**/*.mbt.md"]
///
/// [exclude]
/// patterns = ["drafts/"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CheckConfig {
	/// Directory the synthesized project is written to, relative to the
	/// project root. Cleared before every run.
	#[serde(default = "default_output_dir")]
	pub output_dir: PathBuf,
	/// Directory holding supplementary `*.mbt` files copied into matching
	/// groups.
	#[serde(default)]
	pub complementary: Option<PathBuf>,
	/// Run `moon test` after a successful `moon check`.
	#[serde(default)]
	pub test: bool,
	/// The checker executable.
	#[serde(default = "default_moon")]
	pub moon: String,
	/// Value of `warn-list` in every generated package descriptor.
	#[serde(default = "default_warn_list")]
	pub warn_list: String,
	/// Metadata of the generated root module.
	#[serde(default)]
	pub module: ModuleConfig,
	/// Glob patterns restricting which documents are discovered when no
	/// document paths are passed explicitly.
	#[serde(default)]
	pub include: IncludeConfig,
	/// Gitignore-style patterns for paths skipped during discovery.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// When true, `.gitignore` is not consulted during document discovery.
	#[serde(default)]
	pub disable_gitignore: bool,
}

impl Default for CheckConfig {
	fn default() -> Self {
		Self {
			output_dir: default_output_dir(),
			complementary: None,
			test: false,
			moon: default_moon(),
			warn_list: default_warn_list(),
			module: ModuleConfig::default(),
			include: IncludeConfig::default(),
			exclude: ExcludeConfig::default(),
			disable_gitignore: false,
		}
	}
}

/// The `[module]` table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ModuleConfig {
	#[serde(default = "default_module_name")]
	pub name: String,
	#[serde(default = "default_module_version")]
	pub version: String,
}

impl Default for ModuleConfig {
	fn default() -> Self {
		Self {
			name: default_module_name(),
			version: default_module_version(),
		}
	}
}

/// Configuration for restricting document discovery.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncludeConfig {
	/// Glob patterns relative to the project root. Empty means every
	/// `*.mbt.md` file is a candidate.
	#[serde(default)]
	pub patterns: Vec<String>,
}

/// Configuration for excluding files and directories from discovery.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeConfig {
	/// Gitignore-style patterns, e.g. `"drafts/"` or `"*.wip.mbt.md"`.
	#[serde(default)]
	pub patterns: Vec<String>,
}

fn default_output_dir() -> PathBuf {
	PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_moon() -> String {
	DEFAULT_MOON.to_string()
}

fn default_warn_list() -> String {
	DEFAULT_WARN_LIST.to_string()
}

fn default_module_name() -> String {
	DEFAULT_MODULE_NAME.to_string()
}

fn default_module_version() -> String {
	DEFAULT_MODULE_VERSION.to_string()
}

impl CheckConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> MbtCheckResult<Option<CheckConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;
		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}

	/// Load the config at `root`, falling back to defaults when none exists.
	pub fn load_or_default(root: &Path) -> MbtCheckResult<CheckConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	/// Parse config from a TOML string.
	pub fn parse(content: &str) -> MbtCheckResult<CheckConfig> {
		toml::from_str(content).map_err(|e| MbtCheckError::ConfigParse(e.to_string()))
	}
}
