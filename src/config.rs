// ⚙️ Gateway Configuration
// Where the reference lists live and how dates / QXBANs are judged.
// Every field has a default, so an empty `{}` file is a valid configuration.

use crate::lists::{FileListProvider, ListKind};
use crate::qxban::QxbanFormat;
use crate::rules::RuleEngine;
use crate::temporal::{DateEvaluator, SystemClock, WindowBoundary};
use anyhow::{bail, Context as AnyhowContext, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// LIST PATHS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPaths {
    #[serde(default = "default_receiver_bic")]
    pub receiver_bic: PathBuf,

    #[serde(default = "default_receiver_account")]
    pub receiver_account: PathBuf,

    #[serde(default = "default_sender_bic")]
    pub sender_bic: PathBuf,

    #[serde(default = "default_sender_blacklist")]
    pub sender_blacklist: PathBuf,

    #[serde(default = "default_priority")]
    pub priority: PathBuf,
}

fn default_receiver_bic() -> PathBuf {
    PathBuf::from("config/configRcvBIC.json")
}

fn default_receiver_account() -> PathBuf {
    PathBuf::from("config/configRcvQXBAN.json")
}

fn default_sender_bic() -> PathBuf {
    PathBuf::from("config/configSndBIC.json")
}

fn default_sender_blacklist() -> PathBuf {
    PathBuf::from("config/configSndBlackListQxban.json")
}

fn default_priority() -> PathBuf {
    PathBuf::from("config/configPriority.json")
}

impl Default for ListPaths {
    fn default() -> Self {
        ListPaths {
            receiver_bic: default_receiver_bic(),
            receiver_account: default_receiver_account(),
            sender_bic: default_sender_bic(),
            sender_blacklist: default_sender_blacklist(),
            priority: default_priority(),
        }
    }
}

impl ListPaths {
    pub fn path(&self, kind: ListKind) -> &Path {
        match kind {
            ListKind::ReceiverBic => &self.receiver_bic,
            ListKind::ReceiverAccount => &self.receiver_account,
            ListKind::SenderBic => &self.sender_bic,
            ListKind::SenderBlacklist => &self.sender_blacklist,
            ListKind::Priority => &self.priority,
        }
    }

    /// Anchor relative paths at `base`; absolute paths are kept
    pub fn joined_to(&self, base: &Path) -> Self {
        self.map_relative(|path| base.join(path))
    }

    /// Like `joined_to`, but drops the default `config/` prefix so a bare directory of list files works
    pub fn resolved_against(&self, dir: &Path) -> Self {
        self.map_relative(|path| dir.join(path.strip_prefix("config").unwrap_or(path)))
    }

    fn map_relative<F>(&self, relative: F) -> Self
    where
        F: Fn(&Path) -> PathBuf,
    {
        let resolve = |path: &PathBuf| {
            if path.is_absolute() {
                path.clone()
            } else {
                relative(path.as_path())
            }
        };

        ListPaths {
            receiver_bic: resolve(&self.receiver_bic),
            receiver_account: resolve(&self.receiver_account),
            sender_bic: resolve(&self.sender_bic),
            sender_blacklist: resolve(&self.sender_blacklist),
            priority: resolve(&self.priority),
        }
    }
}

// ============================================================================
// GATEWAY CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Location of the five reference lists
    #[serde(default)]
    pub lists: ListPaths,

    /// Forward slack (clock skew) accepted on a send date, in milliseconds
    #[serde(default = "default_date_tolerance_ms")]
    pub date_tolerance_ms: u64,

    /// Whether a date equal to "now" is inside the window
    #[serde(default)]
    pub window_boundary: WindowBoundary,

    /// QXBAN grammar constants
    #[serde(default)]
    pub qxban: QxbanFormat,
}

fn default_date_tolerance_ms() -> u64 {
    3_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            lists: ListPaths::default(),
            date_tolerance_ms: default_date_tolerance_ms(),
            window_boundary: WindowBoundary::default(),
            qxban: QxbanFormat::default(),
        }
    }
}

impl GatewayConfig {
    /// Load from a JSON file; relative list paths resolve next to the file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read gateway config: {:?}", path))?;

        let mut config: GatewayConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse gateway config: {:?}", path))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.lists = config.lists.joined_to(base);

        config
            .validate()
            .with_context(|| format!("Invalid gateway config: {:?}", path))?;

        Ok(config)
    }

    /// Explicit file if given, otherwise defaults relative to the working directory
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Tolerance as a chrono duration; None when it does not fit one
    pub fn date_tolerance(&self) -> Option<Duration> {
        i64::try_from(self.date_tolerance_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
    }

    /// Reject values that cannot be used as-is
    pub fn validate(&self) -> Result<()> {
        if self.date_tolerance().is_none() {
            bail!(
                "date_tolerance_ms {} is out of range (max {})",
                self.date_tolerance_ms,
                Duration::MAX.num_milliseconds()
            );
        }
        Ok(())
    }

    pub fn date_evaluator(&self) -> DateEvaluator {
        DateEvaluator::new(self.date_tolerance().unwrap_or(Duration::MAX))
            .with_boundary(self.window_boundary)
    }

    /// Production engine: lists re-read from disk, wall clock
    pub fn build_engine(&self) -> RuleEngine<FileListProvider, SystemClock> {
        RuleEngine::new(FileListProvider::new(self.lists.clone()), SystemClock)
            .with_date_evaluator(self.date_evaluator())
            .with_qxban_format(self.qxban.clone())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::FixedClock;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();

        assert_eq!(config.date_tolerance_ms, 3_000);
        assert_eq!(config.window_boundary, WindowBoundary::Exclusive);
        assert_eq!(config.qxban.filler, "XXX");
        assert_eq!(
            config.lists.path(ListKind::SenderBlacklist),
            Path::new("config/configSndBlackListQxban.json")
        );
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("smack.json");
        fs::write(&path, "{}").unwrap();

        let config = GatewayConfig::from_file(&path).unwrap();
        assert_eq!(config.date_tolerance_ms, 3_000);
        assert_eq!(
            config.lists.receiver_bic,
            dir.path().join("config/configRcvBIC.json")
        );
    }

    #[test]
    fn test_file_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("smack.json");
        fs::write(
            &path,
            r#"{
                "lists": { "priority": "/etc/smack/priority.json" },
                "date_tolerance_ms": 5000,
                "window_boundary": "inclusive",
                "qxban": { "marker": "V1" }
            }"#,
        )
        .unwrap();

        let config = GatewayConfig::from_file(&path).unwrap();
        assert_eq!(config.date_tolerance(), Some(Duration::seconds(5)));
        assert_eq!(config.window_boundary, WindowBoundary::Inclusive);
        assert_eq!(config.qxban.marker, "V1");
        assert_eq!(config.qxban.filler, "XXX");
        assert_eq!(config.lists.priority, PathBuf::from("/etc/smack/priority.json"));
    }

    #[test]
    fn test_out_of_range_tolerance_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("smack.json");

        for value in ["18446744073709551615", "9223372036854775808"] {
            fs::write(&path, format!(r#"{{"date_tolerance_ms": {}}}"#, value)).unwrap();

            let err = GatewayConfig::from_file(&path).unwrap_err();
            assert!(format!("{:#}", err).contains("out of range"), "{} accepted", value);
        }
    }

    #[test]
    fn test_large_tolerance_never_goes_negative() {
        let config = GatewayConfig {
            date_tolerance_ms: u64::MAX,
            ..GatewayConfig::default()
        };
        assert!(config.validate().is_err());

        // Built directly, without validation: saturates instead of wrapping
        let evaluator = config.date_evaluator();
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert!(evaluator.is_within_window(now + Duration::seconds(1), now));
    }

    #[test]
    fn test_huge_in_range_tolerance_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("smack.json");
        fs::write(&path, r#"{"date_tolerance_ms": 9000000000000000000}"#).unwrap();

        let config = GatewayConfig::from_file(&path).unwrap();
        let engine = RuleEngine::new(
            crate::lists::InMemoryListProvider::new(),
            FixedClock(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()),
        )
        .with_date_evaluator(config.date_evaluator());

        assert!(engine.verify_date_correct("2024-03-15T12:00:01Z").unwrap());
    }

    #[test]
    fn test_missing_config_file_fails() {
        let result = GatewayConfig::from_file("/nonexistent/smack.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_resolved_against_directory() {
        let paths = ListPaths::default().resolved_against(Path::new("/srv/lists"));
        assert_eq!(paths.sender_bic, PathBuf::from("/srv/lists/configSndBIC.json"));
    }
}
