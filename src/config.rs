use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

const CONFIG_PATH: &str = "config.json";

/// immutable through full lifetime of app, unless restart app.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub console: ConsoleConfig,
    pub chat: ChatConfig,
    pub restart: RestartConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    /// Round-trip bound for authentication and each command, in ms.
    pub timeout_ms: u64,
    /// Accepted response size; 0 means no limit.
    pub max_packet_size: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 27015,
            password: String::new(),
            timeout_ms: 1000,
            max_packet_size: 0,
        }
    }
}

/// The chat collaborator only relays commands from this group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    pub group_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartConfig {
    /// Directory holding the game server's compose file.
    pub compose_dir: String,
    /// Local hour of the unconditional daily restart.
    pub hour: u32,
    /// Grace period of the daily path before the flag clears, secs.
    pub grace_secs: u64,
    /// Interactive recovery budget.
    pub retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            compose_dir: "/etc/docker/containers/cs2/".to_string(),
            hour: 4,
            grace_secs: 600,
            retries: 5,
            retry_delay_secs: 120,
        }
    }
}

impl AppConfig {
    fn load() -> AppConfig {
        Self::load_or_write_default(CONFIG_PATH).unwrap_or_else(|err| {
            log::error!("could not load {}: {:#}, using defaults", CONFIG_PATH, err);
            AppConfig::default()
        })
    }

    fn load_or_write_default<P: AsRef<Path>>(path: P) -> anyhow::Result<AppConfig> {
        let path = path.as_ref();
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => {
                let content = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&content)?)
            }
            _ => {
                let config = AppConfig::default();
                Self::save(path, &config)?;
                Ok(config)
            }
        }
    }

    fn save(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
        if path.exists() {
            std::fs::copy(path, path.with_extension("bak"))?;
        }
        std::fs::write(path, serde_json::to_string_pretty(config)?)?;
        Ok(())
    }
}

static APP_CONFIG: LazyLock<AppConfig> = LazyLock::new(AppConfig::load);

impl AppConfig {
    pub fn get() -> &'static AppConfig {
        &APP_CONFIG
    }
}

/// Minimum interval between mode/map changes. The development flag
/// shortens it so manual testing does not sit out the full window.
pub fn cooldown() -> Duration {
    if std::env::var("CS2_RELAY_ENV").as_deref() == Ok("development") {
        Duration::from_secs(3)
    } else {
        Duration::from_secs(30)
    }
}
