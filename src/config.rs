use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "CuraBot";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "info,curabot=debug".to_string()
}

/// Get the application data directory
/// ~/CuraBot/ on all platforms
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("CuraBot")
}

/// Runtime configuration, read once at startup and passed down
/// explicitly — no module-level singletons.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub ollama_url: String,
    pub ollama_model: String,
    pub ollama_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment, falling back to defaults.
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("CURABOT_BIND")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| "127.0.0.1:8080".parse().expect("static addr"));

        let db_path = std::env::var("CURABOT_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| app_data_dir().join("curabot.db"));

        let ollama_url = std::env::var("CURABOT_OLLAMA_URL")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());

        let ollama_model =
            std::env::var("CURABOT_MODEL").unwrap_or_else(|_| "llama3:8b".to_string());

        Self {
            bind_addr,
            db_path,
            ollama_url,
            ollama_model,
            ollama_timeout_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("CuraBot"));
    }

    #[test]
    fn app_name_is_curabot() {
        assert_eq!(APP_NAME, "CuraBot");
    }

    #[test]
    fn defaults_are_local() {
        // Note: reads real env; the defaults only apply when unset.
        let cfg = AppConfig::from_env();
        assert!(cfg.ollama_timeout_secs > 0);
        assert!(!cfg.ollama_model.is_empty());
    }
}
