mod util;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;
use util::{TempFixtureDir, fixture_dir};

/// Binary pointed at the fixture data with an isolated, empty config dir.
fn base_cmd(config_home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("orgdir"));
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("ORGDIR_CONFIG")
        .env_remove("RUST_LOG")
        .env("ORGDIR_DATA_DIR", fixture_dir());
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout is JSON")
}

#[test]
fn search_returns_listing_envelope() {
    let home = TempDir::new().unwrap();
    let json = json_stdout(base_cmd(&home).args(["search", "--filter", "HQ_SALES_REGION=EMEA"]));
    assert_eq!(json["total"], 2);
    assert_eq!(json["page"], 1);
    assert_eq!(json["pageSize"], 25);
    assert_eq!(json["data"][0]["ORG_NAME"], "Framestore");
    assert_eq!(json["data"][1]["ORG_NAME"], "The Mill");
}

#[test]
fn search_ranks_by_name() {
    let home = TempDir::new().unwrap();
    let json = json_stdout(base_cmd(&home).args(["search", "-q", "autodesk"]));
    assert_eq!(json["total"], 1);
    assert_eq!(json["query"], "autodesk");
    assert_eq!(json["data"][0]["ORG_ID"], "acme");
}

#[test]
fn search_scope_and_years() {
    let home = TempDir::new().unwrap();
    let json = json_stdout(base_cmd(&home).args([
        "search",
        "--filter",
        "HQ_SALES_REGION=North America",
        "--scope",
        "all",
    ]));
    assert_eq!(json["total"], 3);

    let json = json_stdout(base_cmd(&home).args(["search", "--year-min", "1990"]));
    assert_eq!(json["total"], 2);

    // malformed bound is ignored
    let json = json_stdout(base_cmd(&home).args(["search", "--year-min", "soon"]));
    assert_eq!(json["total"], 5);
}

#[test]
fn search_pages_with_lenient_params() {
    let home = TempDir::new().unwrap();
    let json = json_stdout(base_cmd(&home).args(["search", "--page", "3", "--page-size", "2"]));
    assert_eq!(json["total"], 5);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let json = json_stdout(base_cmd(&home).args(["search", "--page", "abc"]));
    assert_eq!(json["page"], 1);
}

#[test]
fn search_markdown_format() {
    let home = TempDir::new().unwrap();
    base_cmd(&home)
        .args(["--format", "markdown", "search", "--filter", "SERVICES=VFX Services"])
        .assert()
        .success()
        .stdout(contains("# Search Results"))
        .stdout(contains("3 of 3"))
        .stdout(contains("Weta FX"));
}

#[test]
fn infra_search_plain_text() {
    let home = TempDir::new().unwrap();
    base_cmd(&home)
        .args(["infra-search", "--format", "text", "--filter", "PARENT_ORG=Autodesk, Inc."])
        .assert()
        .success()
        .stdout(contains("SEARCH RESULTS"))
        .stdout(contains("[1] Maya"))
        .stdout(contains("Softimage"))
        .stdout(contains("Nuke").not());
}

#[test]
fn tree_and_points() {
    let home = TempDir::new().unwrap();
    let tree = json_stdout(base_cmd(&home).arg("tree"));
    assert_eq!(tree[0]["name"], "North America");
    assert_eq!(tree[2]["name"], "EMEA");
    assert_eq!(tree[2]["totalOrgs"], 3);
    assert_eq!(tree[2]["hqOrgs"], 2);

    let filtered = json_stdout(base_cmd(&home).args(["tree", "--filter", "SIZING=1-10"]));
    assert_eq!(filtered.as_array().unwrap().len(), 1);
    assert_eq!(filtered[0]["name"], "Latin America");

    let points = json_stdout(base_cmd(&home).arg("points"));
    assert_eq!(points.as_array().unwrap().len(), 8);
    assert!(points[0]["locationId"].is_string());
}

#[test]
fn summary_respects_scope() {
    let home = TempDir::new().unwrap();
    let hq = json_stdout(base_cmd(&home).args(["summary", "region", "EMEA"]));
    assert_eq!(hq["totalOrgs"], 2);
    assert_eq!(hq["scope"], "hq");

    let all = json_stdout(base_cmd(&home).args(["summary", "region", "emea", "--scope", "all"]));
    assert_eq!(all["totalOrgs"], 3);
    assert_eq!(all["hqOrgs"], 2);
    assert_eq!(all["children"][0]["name"], "United Kingdom");

    let lenient = json_stdout(base_cmd(&home).args([
        "summary",
        "region",
        "EMEA",
        "--scope",
        "everywhere",
    ]));
    assert_eq!(lenient["scope"], "hq");
    assert_eq!(lenient["totalOrgs"], 2);
}

#[test]
fn facets_and_values() {
    let home = TempDir::new().unwrap();
    let facets = json_stdout(base_cmd(&home).args(["facets", "SERVICES", "--limit", "2"]));
    assert_eq!(facets.as_array().unwrap().len(), 2);
    assert_eq!(facets[0]["name"], "VFX Services");
    assert_eq!(facets[0]["count"], 3);

    let values = json_stdout(base_cmd(&home).args(["values", "PRICING", "--infra"]));
    assert_eq!(values[0], "FREE");
    assert_eq!(values[4], "END_OF_LIFE");
}

#[test]
fn unknown_field_fails() {
    let home = TempDir::new().unwrap();
    base_cmd(&home)
        .args(["values", "SHOE_SIZE"])
        .assert()
        .code(1)
        .stderr(contains("unknown field 'SHOE_SIZE'"));
}

#[test]
fn org_and_infra_lookups() {
    let home = TempDir::new().unwrap();
    let org = json_stdout(base_cmd(&home).args(["org", "acme"]));
    assert_eq!(org["organization"]["ORG_NAME"], "Autodesk, Inc.");
    assert_eq!(org["identifiers"][0]["DOMAIN"], "autodesk.com");
    assert_eq!(org["locations"].as_array().unwrap().len(), 2);

    let infra = json_stdout(base_cmd(&home).args(["infra", "maya"]));
    assert_eq!(infra["infra"]["INFRA_NAME"], "Maya");
    assert_eq!(infra["orgCount"], 3);
}

#[test]
fn missing_records_exit_with_not_found() {
    let home = TempDir::new().unwrap();
    base_cmd(&home)
        .args(["org", "nobody"])
        .assert()
        .code(3)
        .stderr(contains("organization 'nobody' not found"));

    base_cmd(&home)
        .args(["infra", "nothing"])
        .assert()
        .code(3)
        .stderr(contains("not found"));
}

#[test]
fn missing_data_is_a_generic_failure() {
    let home = TempDir::new().unwrap();
    let empty = TempDir::new().unwrap();
    base_cmd(&home)
        .args(["--data-dir", empty.path().to_str().unwrap(), "search"])
        .assert()
        .code(1)
        .stderr(contains("organizations.json"));
}

#[test]
fn config_file_sets_default_page_size() {
    let home = TempDir::new().unwrap();
    let dir = TempFixtureDir::new();
    let config = dir.write("config.toml", "[query]\ndefault_page_size = 2\n");
    let json = json_stdout(base_cmd(&home).args(["--config", config.to_str().unwrap(), "search"]));
    assert_eq!(json["pageSize"], 2);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[test]
fn invalid_config_is_rejected() {
    let home = TempDir::new().unwrap();
    let dir = TempFixtureDir::new();
    let config = dir.write("config.toml", "[query]\nfacet_limit = 0\n");
    base_cmd(&home)
        .args(["--config", config.to_str().unwrap(), "search"])
        .assert()
        .code(1)
        .stderr(contains("facet_limit"));
}

#[test]
fn logs_stay_off_stdout() {
    let home = TempDir::new().unwrap();
    let output = base_cmd(&home)
        .env("RUST_LOG", "debug")
        .arg("tree")
        .assert()
        .success()
        .stderr(contains("snapshot_built"))
        .get_output()
        .stdout
        .clone();
    let parsed: Result<Value, _> = serde_json::from_slice(&output);
    assert!(parsed.is_ok());
}
