use std::error::Error;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const ERROR_CODE_NOT_IMPLEMENTED: &str = "NOT_IMPLEMENTED";

/// Outcome contract of the remote pull/push boundary. The transport is not
/// implemented; both operations return this shape with `success: false` so
/// callers exercise the real contract surface.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SyncData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncData {
    pub prompts_synced: u64,
    pub categories_synced: u64,
    pub action: String,
}

/// Remote settings read from an optional `promptdeck.toml` beside the
/// database. A missing file yields the defaults; a malformed one is an error.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SyncSettings {
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub token_env: Option<String>,
}

impl SyncSettings {
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(SyncError::Io(err)),
        };
        toml::from_str(&raw).map_err(SyncError::Parse)
    }
}

pub struct RemoteSync {
    settings: SyncSettings,
}

impl RemoteSync {
    pub fn new(settings: SyncSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn pull(&self) -> SyncOutcome {
        not_implemented("pull")
    }

    pub fn push(&self) -> SyncOutcome {
        not_implemented("push")
    }
}

fn not_implemented(action: &str) -> SyncOutcome {
    SyncOutcome {
        success: false,
        data: None,
        error: Some(format!("remote {action} is not implemented")),
        error_code: Some(ERROR_CODE_NOT_IMPLEMENTED.to_string()),
    }
}

#[derive(Debug)]
pub enum SyncError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Io(err) => write!(f, "sync settings I/O error: {}", err),
            SyncError::Parse(err) => write!(f, "sync settings parse error: {}", err),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SyncError::Io(err) => Some(err),
            SyncError::Parse(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{RemoteSync, SyncSettings, ERROR_CODE_NOT_IMPLEMENTED};

    fn unique_settings_path() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX_EPOCH")
            .as_nanos();
        std::env::temp_dir().join(format!("promptdeck-sync-{}.toml", nanos))
    }

    #[test]
    fn pull_and_push_report_not_implemented() {
        let remote = RemoteSync::new(SyncSettings::default());

        let pull = remote.pull();
        assert!(!pull.success);
        assert!(pull.data.is_none());
        assert_eq!(pull.error_code.as_deref(), Some(ERROR_CODE_NOT_IMPLEMENTED));

        let push = remote.push();
        assert!(!push.success);
        assert_eq!(push.error_code.as_deref(), Some(ERROR_CODE_NOT_IMPLEMENTED));
    }

    #[test]
    fn missing_settings_file_yields_defaults() {
        let settings = SyncSettings::load(&unique_settings_path()).expect("load should work");
        assert_eq!(settings, SyncSettings::default());
    }

    #[test]
    fn settings_file_parses() {
        let path = unique_settings_path();
        std::fs::write(
            &path,
            "remote_url = \"https://example.com/deck.json\"\ntoken_env = \"DECK_TOKEN\"\n",
        )
        .expect("write should work");

        let settings = SyncSettings::load(&path).expect("load should work");
        assert_eq!(
            settings.remote_url.as_deref(),
            Some("https://example.com/deck.json")
        );
        assert_eq!(settings.token_env.as_deref(), Some("DECK_TOKEN"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_settings_file_is_an_error() {
        let path = unique_settings_path();
        std::fs::write(&path, "remote_url = [not toml").expect("write should work");

        assert!(SyncSettings::load(&path).is_err());

        let _ = std::fs::remove_file(&path);
    }
}
