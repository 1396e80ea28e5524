use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "mirrorstat.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置文件格式错误: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("无效的配置项: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 每页显示的任务数
    pub status_limit: usize,
    /// 定时重启周期（秒），0 表示不提示
    pub restart_interval_secs: u64,
    /// 任务 progress / refresh 调用的超时
    pub accessor_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub download_dir: PathBuf,
    pub cancel_command: String,
    pub header: Option<String>,
    pub page_size_threshold: usize,
    pub category_threshold: usize,
    pub category_shortcuts: usize,
    pub page_steps: Vec<i64>,
    pub menu_columns: usize,
    pub max_concurrent: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            status_limit: 4,
            restart_interval_secs: 86400,
            accessor_timeout_secs: 10,
            request_timeout_secs: 30,
            download_dir: PathBuf::from("./downloads"),
            cancel_command: "c".to_string(),
            header: None,
            page_size_threshold: 30,
            category_threshold: 20,
            category_shortcuts: 9,
            page_steps: vec![1, 2, 4, 6, 8, 10, 15],
            menu_columns: 8,
            max_concurrent: 3,
        }
    }
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&text)
    }

    /// 加载顺序：显式指定的文件 > 当前目录的 mirrorstat.toml > 默认值，最后应用环境变量
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let local = Path::new(DEFAULT_CONFIG_FILE);
        let mut cfg = match path {
            Some(p) => {
                info!("加载配置文件: {}", p.display());
                Self::from_file(p)?
            }
            None if local.exists() => {
                info!("加载配置文件: {}", local.display());
                Self::from_file(local)?
            }
            None => {
                debug!("未找到配置文件，使用默认配置");
                Self::default()
            }
        };

        cfg.apply_env_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MIRRORSTAT_STATUS_LIMIT").filter(|v| !v.trim().is_empty()) {
            self.status_limit = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("MIRRORSTAT_STATUS_LIMIT={}", v)))?;
        }
        if let Some(v) = lookup("MIRRORSTAT_RESTART_INTERVAL").filter(|v| !v.trim().is_empty()) {
            self.restart_interval_secs = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("MIRRORSTAT_RESTART_INTERVAL={}", v)))?;
        }
        if let Some(v) = lookup("MIRRORSTAT_DOWNLOAD_DIR").filter(|v| !v.trim().is_empty()) {
            self.download_dir = PathBuf::from(v.trim());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.status_limit == 0 {
            return Err(ConfigError::Invalid("status_limit 必须大于 0".to_string()));
        }
        if self.accessor_timeout_secs == 0 {
            return Err(ConfigError::Invalid("accessor_timeout_secs 必须大于 0".to_string()));
        }
        if self.menu_columns == 0 {
            return Err(ConfigError::Invalid("menu_columns 必须大于 0".to_string()));
        }
        if self.page_steps.iter().any(|s| *s < 1) {
            return Err(ConfigError::Invalid("page_steps 必须全部大于 0".to_string()));
        }
        Ok(())
    }

    pub fn accessor_timeout(&self) -> Duration {
        Duration::from_secs(self.accessor_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
