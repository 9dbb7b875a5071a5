//! Environment-driven configuration.
//!
//! Everything comes from environment variables (APP_USER, APP_PASS,
//! OPENAI_API_KEY, OPENAI_MODEL, plus the bind address and data
//! directory). Unset credentials mean login always fails and the API
//! stays locked; an unset API key puts the AI features in degraded mode.

use std::path::PathBuf;

/// Model used when OPENAI_MODEL is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Root directory for the record store, chat histories and uploads.
    pub data_dir: PathBuf,
    /// Login credentials. Unset means login always fails.
    pub app_user: Option<String>,
    pub app_pass: Option<String>,
    /// OpenAI API key. Unset means every LLM call fails upstream and
    /// best-effort sites degrade to their placeholders.
    pub openai_api_key: Option<String>,
    pub openai_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            data_dir: PathBuf::from("data"),
            app_user: None,
            app_pass: None,
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("DEMDESK_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let data_dir = std::env::var("DEMDESK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        Self {
            bind_addr,
            data_dir,
            app_user: non_empty(std::env::var("APP_USER").ok()),
            app_pass: non_empty(std::env::var("APP_PASS").ok()),
            openai_api_key: non_empty(std::env::var("OPENAI_API_KEY").ok()),
            openai_model: std::env::var("OPENAI_MODEL")
                .ok()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Path of the record store file.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("dem_projects.json")
    }

    /// Directory for uploaded files.
    pub fn upload_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Directory for per-project chat histories.
    pub fn chats_dir(&self) -> PathBuf {
        self.data_dir.join("chats")
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_data_dir() {
        let config = Config {
            bind_addr: "127.0.0.1:0".into(),
            data_dir: PathBuf::from("/var/demdesk"),
            app_user: None,
            app_pass: None,
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.into(),
        };
        assert_eq!(
            config.store_path(),
            PathBuf::from("/var/demdesk/dem_projects.json")
        );
        assert_eq!(config.upload_dir(), PathBuf::from("/var/demdesk/uploads"));
        assert_eq!(config.chats_dir(), PathBuf::from("/var/demdesk/chats"));
    }
}
