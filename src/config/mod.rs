// ==========================================
// 多厂区 MES 聚合系统 - 配置层
// ==========================================
// 职责: 聚合层运行参数（库路径 / 超时 / 兜底策略）
// ==========================================

pub mod aggregator_config;

// 重导出核心配置
pub use aggregator_config::{config_keys, default_db_path, AggregatorConfig, ConfigError};
