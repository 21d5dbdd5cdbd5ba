use crate::utils::error::{GroupsError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SPOND_BASE_URL: &str = "https://api.spond.com/core/v1";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    pub spond: Option<SpondConfig>,
    pub roster: Option<RosterConfig>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Spond,
    Roster,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpondConfig {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub group_id: Option<String>,
    pub heading_filter: Option<String>,
    pub lookahead_days: Option<u32>,
    pub include_fixed_members: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    pub directory: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    pub directory: Option<String>,
    pub attendees_seed: Option<String>,
    pub groups_seed: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    pub level: Option<String>,
}

impl SpondConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_SPOND_BASE_URL)
    }

    pub fn heading_filter(&self) -> &str {
        self.heading_filter.as_deref().unwrap_or("Trening")
    }

    pub fn lookahead_days(&self) -> u32 {
        self.lookahead_days.unwrap_or(6)
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| GroupsError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| GroupsError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SPOND_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| GroupsError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn host(&self) -> &str {
        self.server.host.as_deref().unwrap_or("0.0.0.0")
    }

    pub fn port(&self) -> u16 {
        self.server.port.unwrap_or(8000)
    }

    pub fn bind(&self) -> String {
        format!("{}:{}", self.host(), self.port())
    }

    pub fn allowed_origins(&self) -> &[String] {
        self.server.allowed_origins.as_deref().unwrap_or(&[])
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds.unwrap_or(15))
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_positive_number("server.port", u64::from(self.port()), 1)?;
        validation::validate_positive_number(
            "source.timeout_seconds",
            self.fetch_timeout().as_secs(),
            1,
        )?;

        match self.source.kind {
            SourceKind::Spond => {
                let spond = validation::validate_required_field("spond", &self.spond)?;
                validation::validate_url("spond.base_url", spond.base_url())?;
                let username = validation::validate_required_field("spond.username", &spond.username)?;
                validation::validate_non_empty_string("spond.username", username)?;
                let password = validation::validate_required_field("spond.password", &spond.password)?;
                validation::validate_non_empty_string("spond.password", password)?;
                let group_id = validation::validate_required_field("spond.group_id", &spond.group_id)?;
                validation::validate_non_empty_string("spond.group_id", group_id)?;
                validation::validate_range("spond.lookahead_days", spond.lookahead_days(), 1, 60)?;

                // 未替換的 ${VAR} 代表環境變數沒有設定
                if password.starts_with("${") {
                    return Err(GroupsError::InvalidConfigValueError {
                        field: "spond.password".to_string(),
                        value: password.clone(),
                        reason: "environment variable is not set".to_string(),
                    });
                }
            }
            SourceKind::Roster => {
                let roster = validation::validate_required_field("roster", &self.roster)?;
                validation::validate_path("roster.directory", &roster.directory)?;
            }
        }

        if self.store.kind == StoreKind::File {
            let directory =
                validation::validate_required_field("store.directory", &self.store.directory)?;
            validation::validate_path("store.directory", directory)?;
        }
        for (field, seed) in [
            ("store.attendees_seed", &self.store.attendees_seed),
            ("store.groups_seed", &self.store.groups_seed),
        ] {
            if let Some(seed) = seed {
                validation::validate_path(field, seed)?;
            }
        }

        for origin in self.allowed_origins() {
            validation::validate_url("server.allowed_origins", origin)?;
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
