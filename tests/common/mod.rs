//! Shared helpers for star-follower CLI tests

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use star_follower::{StarRecord, StarStore};

/// Scratch directory holding a config file and a database
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with_api_url("http://127.0.0.1:9")
    }

    /// Point the GitHub client at `api_url`, usually a wiremock server
    pub fn with_api_url(api_url: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.yml");
        let db_path = temp_dir.path().join("stars.db");

        let config = format!(
            "database: \"{}\"\ngithub:\n  api_url: \"{}\"\nlogging:\n  level: \"warn\"\n",
            db_path.display(),
            api_url
        );
        std::fs::write(&config_path, config).expect("Failed to write config");

        Self {
            temp_dir,
            config_path,
            db_path,
        }
    }

    /// Binary invocation with the scratch config and XDG home
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_star-follower"));
        cmd.env("XDG_CONFIG_HOME", self.temp_dir.path())
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config_path);
        cmd
    }

    /// Binary invocation relying on the default config location
    pub fn command_without_config(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_star-follower"));
        cmd.env("XDG_CONFIG_HOME", self.temp_dir.path())
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Commit `records` into the scratch database
    pub fn seed(&self, records: Vec<StarRecord>) {
        let mut store = StarStore::open_at(self.db_path.clone()).expect("Failed to open store");
        for record in records {
            store.insert(record).expect("Failed to stage record");
        }
        store.commit().expect("Failed to commit");
    }

    pub fn open_store(&self) -> StarStore {
        open_store(&self.db_path)
    }
}

pub fn open_store(path: &Path) -> StarStore {
    StarStore::open_at(path.to_path_buf()).expect("Failed to open store")
}

pub fn star(repo_id: i64, starred_by: &str, stars: i64, name: &str) -> StarRecord {
    StarRecord {
        starred_by: starred_by.to_string(),
        repo_id,
        stars,
        pushed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        repo_name: Some(name.to_string()),
        repo_url: Some(format!("https://github.com/{}/{}", starred_by, name)),
        description: Some(format!("{} description", name)),
        language: Some("Rust".to_string()),
    }
}

/// A `/starred` entry as GitHub serves it
pub fn starred_entry(repo_id: i64, stars: i64, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": repo_id,
        "name": name,
        "html_url": format!("https://github.com/someone/{}", name),
        "stargazers_count": stars,
        "pushed_at": "2024-05-01T10:00:00Z",
        "description": null,
        "language": "Go",
    })
}
