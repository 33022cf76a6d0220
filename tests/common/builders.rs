#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use batchdag::audit::files::{read_process_audit, ProcessAuditRow};
use batchdag::config::{load_and_validate, BatchConfig};
use batchdag::engine::{BatchRequest, Engine, EngineOptions};

/// A self-contained on-disk batch environment: the directory layout, a
/// written configuration file, and helpers for process lists, job scripts
/// and flag files.
pub struct BatchEnv {
    pub root: TempDir,
    pub batch_name: String,
    pub config_path: PathBuf,
}

impl BatchEnv {
    pub fn new(batch_name: &str) -> Self {
        Self::with_overrides(batch_name, &[])
    }

    /// Build the environment, overriding or adding configuration keys.
    pub fn with_overrides(batch_name: &str, overrides: &[(&str, &str)]) -> Self {
        let root = TempDir::new().expect("create temp dir");

        for dir in ["bin", "log", "common_log", "lock", "poll", "work"] {
            fs::create_dir_all(root.path().join(dir)).expect("create env dir");
        }

        let dir = |name: &str| root.path().join(name).display().to_string();

        let mut keys: Vec<(String, String)> = vec![
            ("ApplicationName".into(), "TESTAPP".into()),
            ("BatchName".into(), batch_name.into()),
            ("JobPollInterval".into(), "1".into()),
            ("MaxParallelJobs".into(), "0".into()),
            ("MaxArchivedLogs".into(), "3".into()),
            ("PerformAuditTableUpdates".into(), "N".into()),
            ("AuditTableUpdateInterval".into(), "1".into()),
            ("AuditTableCriticality".into(), "WARN".into()),
            ("BfBinFileDirectory".into(), dir("bin")),
            ("BfLogFileDirectory".into(), dir("common_log")),
            ("BfLockFileDirectory".into(), dir("lock")),
            ("BinFileDirectory".into(), dir("bin")),
            ("LogFileDirectory".into(), dir("log")),
            ("PollFileDirectory".into(), dir("poll")),
            ("WorkFileDirectory".into(), dir("work")),
            ("SendFailureMessage".into(), "N".into()),
            ("AlertEMailList".into(), String::new()),
        ];

        for (key, value) in overrides {
            match keys.iter_mut().find(|(k, _)| k.as_str() == *key) {
                Some(slot) => slot.1 = (*value).to_string(),
                None => keys.push(((*key).to_string(), (*value).to_string())),
            }
        }

        // Quote the directory values; the loader strips matching quotes.
        let mut contents = String::new();
        for (key, value) in &keys {
            if value.contains('/') {
                contents.push_str(&format!("{key}=\"{value}\"\n"));
            } else {
                contents.push_str(&format!("{key}={value}\n"));
            }
        }

        let config_path = root.path().join("batch.cfg");
        fs::write(&config_path, contents).expect("write config file");

        Self {
            root,
            batch_name: batch_name.to_string(),
            config_path,
        }
    }

    pub fn config(&self) -> BatchConfig {
        load_and_validate(&self.config_path).expect("load config")
    }

    /// Write the `<BatchName>.proc` process list, header line included.
    pub fn write_proc_file(&self, contents: &str) {
        let path = self
            .root
            .path()
            .join("bin")
            .join(format!("{}.proc", self.batch_name));
        fs::write(path, contents).expect("write proc file");
    }

    /// Write an executable `sh` job script into the bin directory.
    pub fn write_script(&self, name: &str, body: &str) {
        let path = self.root.path().join("bin").join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        let mut perms = fs::metadata(&path).expect("script metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod script");
    }

    pub fn flag_path(&self, flag: &str) -> PathBuf {
        self.root.path().join("poll").join(flag)
    }

    pub fn drop_flag(&self, flag: &str) {
        fs::write(self.flag_path(flag), "").expect("drop flag file");
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.path().join("log")
    }

    pub fn batch_audit_path(&self) -> PathBuf {
        self.log_dir()
            .join(format!("{}_BatchAudit.log", self.batch_name))
    }

    pub fn process_audit_path(&self) -> PathBuf {
        self.log_dir()
            .join(format!("{}_ProcessAudit.log", self.batch_name))
    }

    pub fn history_path(&self) -> PathBuf {
        self.root
            .path()
            .join("common_log")
            .join(format!("{}_BatchHistory.log", self.batch_name))
    }

    pub fn archive_root(&self) -> PathBuf {
        self.log_dir().join("archive")
    }

    pub fn read_process_audit(&self) -> Vec<ProcessAuditRow> {
        read_process_audit(self.process_audit_path()).expect("read process audit")
    }

    pub fn read_batch_audit_line(&self) -> String {
        fs::read_to_string(self.batch_audit_path())
            .expect("read batch audit")
            .trim_end()
            .to_string()
    }
}

/// Loop pacing suited for tests: milliseconds instead of seconds.
pub fn fast_options() -> EngineOptions {
    EngineOptions {
        tick: Duration::from_millis(5),
        poll: Some(Duration::from_millis(10)),
        audit: None,
    }
}

/// Bootstrap an engine against the environment with fast pacing.
pub async fn bootstrap(env: &BatchEnv, request: BatchRequest) -> Engine {
    Engine::bootstrap(env.config(), request, fast_options())
        .await
        .expect("engine bootstrap")
}
