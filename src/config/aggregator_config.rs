// ==========================================
// 多厂区 MES 聚合系统 - 聚合层配置
// ==========================================
// 职责: 厂区库路径、扇出超时、兜底开关
// 来源优先级: 环境变量 > JSON 配置文件 > 默认值
// ==========================================

use crate::domain::types::FabId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// 默认扇出总超时（毫秒）
pub const DEFAULT_FANOUT_TIMEOUT_MS: u64 = 3_000;

// ==========================================
// 配置键常量（环境变量名）
// ==========================================
pub mod config_keys {
    pub const CONFIG_FILE: &str = "FAB_MES_CONFIG";
    pub const M14_DB_PATH: &str = "FAB_MES_M14_DB_PATH";
    pub const M15_DB_PATH: &str = "FAB_MES_M15_DB_PATH";
    pub const M16_DB_PATH: &str = "FAB_MES_M16_DB_PATH";
    pub const FANOUT_TIMEOUT_MS: &str = "FAB_MES_FANOUT_TIMEOUT_MS";
    pub const FALLBACK_ENABLED: &str = "FAB_MES_FALLBACK_ENABLED";
}

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("配置值无效 (key={key}): {value}")]
    InvalidValue { key: String, value: String },
}

// ==========================================
// AggregatorConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub m14_db_path: String,
    pub m15_db_path: String,
    pub m16_db_path: String,
    /// 全厂区扇出的总超时
    pub fanout_timeout_ms: u64,
    /// 所有路由厂区均失败时是否返回演示数据
    pub fallback_enabled: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            m14_db_path: default_db_path(FabId::M14),
            m15_db_path: default_db_path(FabId::M15),
            m16_db_path: default_db_path(FabId::M16),
            fanout_timeout_ms: DEFAULT_FANOUT_TIMEOUT_MS,
            fallback_enabled: true,
        }
    }
}

impl AggregatorConfig {
    /// 加载配置：FAB_MES_CONFIG 指向的 JSON 文件（可选）+ 环境变量覆写
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(config_keys::CONFIG_FILE) {
            Ok(path) if !path.trim().is_empty() => Self::from_json_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 从 JSON 文件读取（缺省字段取默认值）
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// 按 key 查找覆写值（空白值忽略）
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get(config_keys::M14_DB_PATH) {
            self.m14_db_path = v;
        }
        if let Some(v) = get(config_keys::M15_DB_PATH) {
            self.m15_db_path = v;
        }
        if let Some(v) = get(config_keys::M16_DB_PATH) {
            self.m16_db_path = v;
        }
        if let Some(v) = get(config_keys::FANOUT_TIMEOUT_MS) {
            self.fanout_timeout_ms = v
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: config_keys::FANOUT_TIMEOUT_MS.to_string(),
                    value: v.clone(),
                })?;
        }
        if let Some(v) = get(config_keys::FALLBACK_ENABLED) {
            self.fallback_enabled = match v.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: config_keys::FALLBACK_ENABLED.to_string(),
                        value: v,
                    })
                }
            };
        }
        Ok(())
    }

    pub fn db_path(&self, fab: FabId) -> &str {
        match fab {
            FabId::M14 => &self.m14_db_path,
            FabId::M15 => &self.m15_db_path,
            FabId::M16 => &self.m16_db_path,
        }
    }

    pub fn fanout_timeout(&self) -> Duration {
        Duration::from_millis(self.fanout_timeout_ms)
    }
}

/// 厂区库默认路径：用户数据目录下 fab-mes(-dev)/{fab}.db
pub fn default_db_path(fab: FabId) -> String {
    let file_name = format!("{}.db", fab.as_str().to_lowercase());

    let dir = match dirs::data_dir() {
        Some(data_dir) => {
            if cfg!(debug_assertions) {
                data_dir.join("fab-mes-dev")
            } else {
                data_dir.join("fab-mes")
            }
        }
        None => PathBuf::from("."),
    };

    dir.join(file_name).to_string_lossy().to_string()
}
