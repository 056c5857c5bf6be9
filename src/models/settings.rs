use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Delay before the reconciliation reload that follows every mutation
    pub reload_delay_ms: u64,
    pub unread_poll_secs: u64,
    pub invitation_poll_secs: u64,
    /// Toast once per project when the unread-updates poll finds something
    pub notify_on_unread: bool,
    pub theme: Theme,
    pub data_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            reload_delay_ms: 500,
            unread_poll_secs: 10,
            invitation_poll_secs: 30,
            notify_on_unread: false,
            theme: Theme::Light,
            data_dir: None,
        }
    }
}

impl AppSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload_delay_ms)
    }

    pub fn unread_poll_interval(&self) -> Duration {
        Duration::from_secs(self.unread_poll_secs.max(1))
    }

    pub fn invitation_poll_interval(&self) -> Duration {
        Duration::from_secs(self.invitation_poll_secs.max(1))
    }
}
