#![forbid(unsafe_code)]

use kb_core::store::{
    DEFAULT_HISTORY_CAP, DEFAULT_RETENTION_DAYS, DEFAULT_UNDO_WINDOW_MS, StoreSettings,
    retention_ms,
};
use kb_core::TimestampMs;
use kb_sync::{DEFAULT_ECHO_TTL_MS, DEFAULT_LOCAL_GRACE_MS, DEFAULT_SAVE_DEBOUNCE_MS, SyncSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use time::UtcOffset;

pub(crate) const ENV_STORAGE_DIR: &str = "KB_STORAGE_DIR";
pub(crate) const ENV_ACTOR: &str = "KB_ACTOR";
pub(crate) const ENV_UTC_OFFSET_MINUTES: &str = "KB_UTC_OFFSET_MINUTES";

const DEFAULT_STORAGE_DIR: &str = ".kitchen_board";
const DEFAULT_ACTOR: &str = "kitchen";
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("{var}: {message}")]
    Env { var: &'static str, message: String },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct BoardConfig {
    pub(crate) storage_dir: PathBuf,
    pub(crate) actor: String,
    /// `None` means the system local offset, or UTC when that is unknown.
    pub(crate) utc_offset_minutes: Option<i32>,
    pub(crate) history_cap: usize,
    pub(crate) timing: TimingConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            actor: DEFAULT_ACTOR.to_string(),
            utc_offset_minutes: None,
            history_cap: DEFAULT_HISTORY_CAP,
            timing: TimingConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TimingConfig {
    pub(crate) undo_window_ms: TimestampMs,
    pub(crate) local_grace_ms: TimestampMs,
    pub(crate) echo_ttl_ms: TimestampMs,
    pub(crate) save_debounce_ms: TimestampMs,
    pub(crate) retention_days: i64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            undo_window_ms: DEFAULT_UNDO_WINDOW_MS,
            local_grace_ms: DEFAULT_LOCAL_GRACE_MS,
            echo_ttl_ms: DEFAULT_ECHO_TTL_MS,
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl BoardConfig {
    /// Reads `path` when given, then applies environment overrides. A file
    /// that cannot be used leaves the defaults in place; every problem is
    /// returned so the caller can log it.
    pub(crate) fn load(path: Option<&Path>) -> (Self, Vec<ConfigError>) {
        let mut problems = Vec::new();
        let mut config = match path {
            None => Self::default(),
            Some(path) => Self::from_file(path).unwrap_or_else(|err| {
                problems.push(err);
                Self::default()
            }),
        };
        config.apply_env(|var| std::env::var(var).ok(), &mut problems);
        (config, problems)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub(crate) fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub(crate) fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
        problems: &mut Vec<ConfigError>,
    ) {
        if let Some(dir) = lookup(ENV_STORAGE_DIR).filter(|v| !v.trim().is_empty()) {
            self.storage_dir = PathBuf::from(dir.trim());
        }
        if let Some(actor) = lookup(ENV_ACTOR).filter(|v| !v.trim().is_empty()) {
            self.actor = actor.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_UTC_OFFSET_MINUTES) {
            match raw.trim().parse::<i32>() {
                Ok(minutes) => self.utc_offset_minutes = Some(minutes),
                Err(err) => problems.push(ConfigError::Env {
                    var: ENV_UTC_OFFSET_MINUTES,
                    message: format!("`{raw}` is not a whole number of minutes ({err})"),
                }),
            }
        }
    }

    /// Offset that decides where "today" starts.
    pub(crate) fn utc_offset(&self) -> UtcOffset {
        match self.utc_offset_minutes {
            Some(minutes) => {
                let minutes = minutes.clamp(-MAX_OFFSET_MINUTES, MAX_OFFSET_MINUTES);
                UtcOffset::from_whole_seconds(minutes * 60).unwrap_or(UtcOffset::UTC)
            }
            None => UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    pub(crate) fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            store: StoreSettings {
                history_cap: self.history_cap.max(1),
                undo_window_ms: self.timing.undo_window_ms.max(0),
            },
            local_grace_ms: self.timing.local_grace_ms.max(0),
            echo_ttl_ms: self.timing.echo_ttl_ms.max(0),
            save_debounce_ms: self.timing.save_debounce_ms.max(0),
        }
    }

    pub(crate) fn retention_ms(&self) -> TimestampMs {
        retention_ms(self.timing.retention_days)
    }
}
