use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use mbt_check_cli::MbtCheckCli;
use mbt_check_cli::extra_watch_dirs;
use mbt_check_cli::is_output_event;
use mbt_check_cli::resolve_program;
use mbt_check_core::AnyResult;
use mbt_check_core::CheckConfig;
use mbt_check_core::CheckReport;
use mbt_check_core::Checker;
use mbt_check_core::MaterializeOptions;
use mbt_check_core::MbtCheckError;
use mbt_check_core::ProjectTree;
use mbt_check_core::ToolOutput;
use mbt_check_core::discover_documents;
use mbt_check_core::generate_project;
use mbt_check_core::list_complementary;
use mbt_check_core::select_documents;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

/// How a single run ended, when it did not fail internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunOutcome {
	Passed,
	/// `moon check` or `moon test` exited unsuccessfully.
	Failed,
}

/// Settings resolved once from the command line and the config file.
#[derive(Debug)]
struct Settings {
	root: PathBuf,
	config: CheckConfig,
	output_root: PathBuf,
	complementary: Option<PathBuf>,
	moon: String,
	run_tests: bool,
}

fn main() {
	let args = MbtCheckCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(&args, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = if args.watch {
		run_watch(&args)
	} else {
		resolve_settings(&args).and_then(|settings| run_once(&args, &settings))
	};

	match result {
		Ok(RunOutcome::Passed) => {}
		Ok(RunOutcome::Failed) => process::exit(1),
		Err(e) => {
			report_error(e);
			process::exit(2);
		}
	}
}

fn init_tracing(args: &MbtCheckCli, use_color: bool) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
	tracing_subscriber::registry()
		.with(filter)
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(use_color)
				.with_target(false),
		)
		.init();
}

fn report_error(error: Box<dyn std::error::Error>) {
	// Try to render through miette for rich diagnostics with help text and
	// error codes.
	match error.downcast::<MbtCheckError>() {
		Ok(mbt_err) => {
			let report: miette::Report = (*mbt_err).into();
			eprintln!("{report:?}");
		}
		Err(e) => {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn resolve_root(args: &MbtCheckCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Merge command line flags over the config file found at the project root.
fn resolve_settings(args: &MbtCheckCli) -> AnyResult<Settings> {
	let root = resolve_root(args);
	let config = CheckConfig::load_or_default(&root)?;

	let output_root = args
		.output
		.clone()
		.unwrap_or_else(|| root.join(&config.output_dir));
	let complementary = args
		.complementary
		.clone()
		.or_else(|| config.complementary.as_ref().map(|dir| root.join(dir)));
	// The checker runs inside the output root, so relative paths are anchored
	// where they were written.
	let moon = match &args.moon {
		Some(moon) => resolve_program(moon, &std::env::current_dir()?),
		None => resolve_program(&config.moon, &root),
	};
	let run_tests = args.test || config.test;

	Ok(Settings {
		root,
		config,
		output_root,
		complementary,
		moon,
		run_tests,
	})
}

/// Select or discover documents, generate the project and run the checker.
fn run_once(args: &MbtCheckCli, settings: &Settings) -> AnyResult<RunOutcome> {
	let documents = if args.files.is_empty() {
		discover_documents(&settings.root, &settings.config)?
	} else {
		select_documents(&args.files)
	};
	if documents.is_empty() {
		tracing::warn!("no `*.mbt.md` documents to check");
	}

	let complementary = match &settings.complementary {
		Some(dir) => list_complementary(dir)?,
		None => Vec::new(),
	};
	let options = MaterializeOptions {
		warn_list: settings.config.warn_list.clone(),
		module: settings.config.module.clone(),
		complementary,
	};

	let (table, tree) = generate_project(&documents, &settings.output_root, &options)?;

	if args.extract_only {
		println!(
			"Extracted {} block(s) from {} document(s) into {} group(s) at {}",
			table.block_count(),
			documents.len(),
			tree.groups.len(),
			tree.root.display()
		);
		return Ok(RunOutcome::Passed);
	}

	let checker = Checker::new(&settings.moon, &tree.root);
	let report = checker.check(settings.run_tests)?;
	relay_output(&report, &tree, args.raw_diagnostics);

	if let Some(failure) = report.failure() {
		let code = failure
			.code
			.map_or_else(|| "signal".to_string(), |code| code.to_string());
		eprintln!(
			"{} moon {} failed (exit code {code})",
			colored!("error:", red),
			failure.subcommand
		);
		eprint!("{}", diagnostics(&failure.stderr, &tree, args.raw_diagnostics));
		return Ok(RunOutcome::Failed);
	}

	let verb = if report.test.is_some() {
		"Check and tests passed"
	} else {
		"Check passed"
	};
	println!(
		"{} {} document(s) in {} group(s).",
		colored!(format!("{verb}:"), green),
		documents.len(),
		tree.groups.len()
	);

	Ok(RunOutcome::Passed)
}

/// Print the standard output of every invocation, and the standard error of
/// the ones that succeeded (warnings).
fn relay_output(report: &CheckReport, tree: &ProjectTree, raw: bool) {
	for output in std::iter::once(&report.check).chain(report.test.as_ref()) {
		print!("{}", diagnostics(&output.stdout, tree, raw));
		if output.success() && !output.stderr.is_empty() {
			print_warnings(output, tree, raw);
		}
	}
}

fn print_warnings(output: &ToolOutput, tree: &ProjectTree, raw: bool) {
	eprintln!("{} moon {} reported:", colored!("warning:", yellow), output.subcommand);
	eprint!("{}", diagnostics(&output.stderr, tree, raw));
}

fn diagnostics(text: &str, tree: &ProjectTree, raw: bool) -> String {
	if raw {
		text.to_string()
	} else {
		tree.source_map.rewrite(text)
	}
}

fn run_watch(args: &MbtCheckCli) -> AnyResult<RunOutcome> {
	let settings = resolve_settings(args)?;
	if let Err(e) = run_once(args, &settings) {
		report_error(e);
	}

	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let (tx, rx) = mpsc::channel();
	let output_root = std::path::absolute(&settings.output_root)?;

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				if matches!(
					event.kind,
					notify::EventKind::Modify(_)
						| notify::EventKind::Create(_)
						| notify::EventKind::Remove(_)
				) && !is_output_event(&event.paths, &output_root)
				{
					let _ = tx.send(());
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(&settings.root, notify::RecursiveMode::Recursive)?;
	for dir in extra_watch_dirs(
		&settings.root,
		&args.files,
		settings.complementary.as_deref(),
	)? {
		tracing::info!(dir = %dir.display(), "watching directory outside the project root");
		watcher.watch(&dir, notify::RecursiveMode::NonRecursive)?;
	}

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, checking...");
		if let Err(e) = run_once(args, &settings) {
			report_error(e);
		}
	}
}
