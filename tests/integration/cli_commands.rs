#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write csv");
    path
}

fn setup_apps() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = write_csv(
        dir.path(),
        "apps.csv",
        "appid,name,mat_final_price\n1,Portal,10.0\n2,Dota,20.0\n3,Quake,15.0\n",
    );
    (dir, path)
}

struct GraphFiles {
    _dir: TempDir,
    developers: PathBuf,
    publishers: PathBuf,
    app_developers: PathBuf,
    app_publishers: PathBuf,
}

fn setup_graph() -> GraphFiles {
    let dir = TempDir::new().expect("tempdir");
    GraphFiles {
        developers: write_csv(dir.path(), "developers.csv", "id,name\n1,Valve\n2,Hidden Path\n3,Indie\n"),
        publishers: write_csv(dir.path(), "publishers.csv", "id,name\n10,Valve\n11,Devolver\n"),
        app_developers: write_csv(
            dir.path(),
            "app_developers.csv",
            "appid,developer_id\n100,1\n100,2\n101,1\n102,2\n300,3\n",
        ),
        app_publishers: write_csv(
            dir.path(),
            "app_publishers.csv",
            "appid,publisher_id\n100,10\n101,10\n102,11\n",
        ),
        _dir: dir,
    }
}

fn graph_json(files: &GraphFiles, action: &[&str]) -> Value {
    let output = cargo_bin_cmd!("minidb")
        .args(["--format", "json", "graph"])
        .arg("--a")
        .arg(&files.developers)
        .arg("--b")
        .arg(&files.publishers)
        .arg("--a-links")
        .arg(&files.app_developers)
        .arg("--b-links")
        .arg(&files.app_publishers)
        .args(action)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("valid json")
}

#[test]
fn store_range_emits_json_in_key_order() {
    let (_dir, csv) = setup_apps();
    let output = cargo_bin_cmd!("minidb")
        .args(["--format", "json", "store"])
        .arg(&csv)
        .args(["--index", "mat_final_price", "--key", "appid"])
        .args(["range", "mat_final_price", "12", "20"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["matched"], 2);
    assert_eq!(json["records"][0]["record"]["appid"], 3);
    assert_eq!(json["records"][1]["record"]["appid"], 2);
}

#[test]
fn store_search_and_delete() {
    let (_dir, csv) = setup_apps();
    let output = cargo_bin_cmd!("minidb")
        .args(["--format", "json", "store"])
        .arg(&csv)
        .args(["--key", "appid", "search", "2"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["records"][0]["slot"], 1);
    assert_eq!(json["records"][0]["record"]["name"], "Dota");

    let output = cargo_bin_cmd!("minidb")
        .args(["--format", "json", "store"])
        .arg(&csv)
        .args(["--key", "appid", "delete", "2"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["deleted"], true);
    assert_eq!(json["remaining"], 2);
}

#[test]
fn store_verify_succeeds() {
    let (_dir, csv) = setup_apps();
    let output = cargo_bin_cmd!("minidb")
        .args(["--format", "json", "store"])
        .arg(&csv)
        .args(["--index", "mat_final_price", "--key", "appid", "verify"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert!(json["success"].as_bool().unwrap_or(false));
    assert_eq!(json["records"], 3);
    assert_eq!(json["indexes"].as_array().map(Vec::len), Some(2));
}

#[test]
fn store_inverted_range_fails() {
    let (_dir, csv) = setup_apps();
    cargo_bin_cmd!("minidb")
        .arg("store")
        .arg(&csv)
        .args(["--index", "mat_final_price", "--key", "appid"])
        .args(["range", "mat_final_price", "20", "12"])
        .assert()
        .failure();
}

#[test]
fn store_missing_column_fails() {
    let (_dir, csv) = setup_apps();
    cargo_bin_cmd!("minidb")
        .arg("store")
        .arg(&csv)
        .args(["--index", "genre", "--key", "appid", "verify"])
        .assert()
        .failure();
}

#[test]
fn store_text_output() {
    let (_dir, csv) = setup_apps();
    let output = cargo_bin_cmd!("minidb")
        .arg("store")
        .arg(&csv)
        .args(["--key", "appid", "search", "3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.starts_with("matched=1"));
    assert!(text.contains("name=Quake"));
}

#[test]
fn graph_summary_counts() {
    let files = setup_graph();
    let json = graph_json(&files, &["summary"]);
    assert_eq!(json["vertices"], 5);
    assert_eq!(json["edges"], 3);
    assert_eq!(json["kinds"]["developer"], 3);
    assert_eq!(json["kinds"]["publisher"], 2);
}

#[test]
fn graph_path_and_components() {
    let files = setup_graph();
    let path = graph_json(&files, &["path", "1", "11"]);
    let ids: Vec<_> = path
        .as_array()
        .expect("path array")
        .iter()
        .map(|row| row["id"].as_i64().unwrap_or_default())
        .collect();
    assert_eq!(ids, vec![1, 10, 2, 11]);

    let components = graph_json(&files, &["components"]);
    let sizes: Vec<_> = components
        .as_array()
        .expect("components array")
        .iter()
        .map(|c| c.as_array().map(Vec::len).unwrap_or_default())
        .collect();
    assert_eq!(sizes, vec![4, 1]);
}

#[test]
fn graph_bfs_and_top() {
    let files = setup_graph();
    let order = graph_json(&files, &["bfs", "publisher", "11"]);
    let first = &order.as_array().expect("order array")[0];
    assert_eq!(first["name"], "Devolver");
    assert_eq!(order.as_array().map(Vec::len), Some(4));

    let top = graph_json(&files, &["top", "--limit", "1"]);
    assert_eq!(top[0]["top"]["name"], "Valve");
    assert_eq!(top[0]["total_weight"], 2);
    assert_eq!(top[1]["top"]["id"], 10);
    assert_eq!(top[1]["neighbors"].as_array().map(Vec::len), Some(1));
}

#[test]
fn graph_unknown_kind_fails() {
    let files = setup_graph();
    cargo_bin_cmd!("minidb")
        .arg("graph")
        .arg("--a")
        .arg(&files.developers)
        .arg("--b")
        .arg(&files.publishers)
        .arg("--a-links")
        .arg(&files.app_developers)
        .arg("--b-links")
        .arg(&files.app_publishers)
        .args(["dfs", "platform", "1"])
        .assert()
        .failure();
}
