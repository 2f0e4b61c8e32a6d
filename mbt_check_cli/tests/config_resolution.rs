mod common;

use mbt_check_core::AnyEmptyResult;
use similar_asserts::assert_eq;

#[test]
fn config_output_dir_is_relative_to_project_root() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let (a, _) = common::write_documents(tmp.path())?;
	std::fs::write(
		tmp.path().join("mbt-check.toml"),
		"output_dir = \"build/docs-check\"\n\n[module]\nname = \"docs\"\n",
	)?;

	common::mbt_check_cmd()
		.arg("--path")
		.arg(tmp.path())
		.arg("--extract-only")
		.arg(&a)
		.assert()
		.success();

	let root = tmp.path().join("build/docs-check");
	assert!(root.join("_/a.md.mbt").is_file());
	let manifest = std::fs::read_to_string(root.join("moon.mod.json"))?;
	assert_eq!(manifest, "{\n  \"name\": \"docs\",\n  \"version\": \"0.1.0\"\n}");

	Ok(())
}

#[test]
fn dot_config_file_is_discovered() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_documents(&tmp.path().join("docs"))?;
	common::write_documents(&tmp.path().join("drafts"))?;
	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(
		tmp.path().join(".config/mbt-check.toml"),
		"warn_list = \"-1\"\n\n[exclude]\npatterns = [\"drafts/\"]\n",
	)?;

	common::mbt_check_cmd()
		.arg("--path")
		.arg(tmp.path())
		.arg("--extract-only")
		.assert()
		.success()
		.stdout(predicates::str::contains("from 2 document(s)"));

	let package =
		std::fs::read_to_string(tmp.path().join("target/moonbit-check/_/moon.pkg.json"))?;
	assert!(package.contains("\"warn-list\": \"-1\""));

	Ok(())
}

#[test]
fn config_complementary_is_relative_to_project_root() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let (a, b) = common::write_documents(tmp.path())?;
	std::fs::create_dir_all(tmp.path().join("support"))?;
	std::fs::write(tmp.path().join("support/gpu.mbt"), "fn gpu() -> Unit { () }\n")?;
	std::fs::write(
		tmp.path().join(".mbt-check.toml"),
		"complementary = \"support\"\n",
	)?;

	common::mbt_check_cmd()
		.arg("--path")
		.arg(tmp.path())
		.arg("--extract-only")
		.arg(&a)
		.arg(&b)
		.assert()
		.success();

	assert!(tmp.path().join("target/moonbit-check/gpu/gpu.mbt").is_file());

	Ok(())
}

#[test]
fn malformed_config_is_an_internal_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let (a, _) = common::write_documents(tmp.path())?;
	std::fs::write(tmp.path().join("mbt-check.toml"), "test = [not valid")?;

	common::mbt_check_cmd()
		.arg("--path")
		.arg(tmp.path())
		.arg("--extract-only")
		.arg(&a)
		.assert()
		.code(2)
		.stderr(predicates::str::contains("mbt_check::config_parse"));

	Ok(())
}

#[cfg(unix)]
#[test]
fn config_enables_tests_and_selects_checker() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let (a, _) = common::write_documents(tmp.path())?;
	let moon = common::fake_moon(tmp.path(), "echo \"configured $1\"\nexit 0")?;
	std::fs::write(
		tmp.path().join("mbt-check.toml"),
		format!("test = true\nmoon = \"{}\"\n", moon.display()),
	)?;

	common::mbt_check_cmd()
		.arg("--path")
		.arg(tmp.path())
		.arg(&a)
		.assert()
		.success()
		.stdout(predicates::str::contains("configured check\nconfigured test"));

	Ok(())
}

#[cfg(unix)]
#[test]
fn config_moon_path_is_relative_to_project_root() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let (a, _) = common::write_documents(tmp.path())?;
	std::fs::create_dir_all(tmp.path().join("tools"))?;
	common::fake_moon(&tmp.path().join("tools"), "echo \"tooling $1\"\nexit 0")?;
	std::fs::write(
		tmp.path().join("mbt-check.toml"),
		"moon = \"tools/fake-moon\"\n",
	)?;

	common::mbt_check_cmd()
		.arg("--path")
		.arg(tmp.path())
		.arg(&a)
		.assert()
		.success()
		.stdout(predicates::str::contains("tooling check"));

	Ok(())
}
