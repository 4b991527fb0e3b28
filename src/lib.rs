// ==========================================
// 多厂区 MES 聚合系统 - 核心库
// ==========================================
// 职责: 对 M14 / M15 / M16 三个厂区库做并发查询聚合
// 技术栈: Rust + Tokio + SQLite
// 读路径策略: 厂区级降级为空，全部不可达时返回兜底数据
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 厂区数据源
pub mod repository;

// 引擎层 - 路由 / 扇出 / 合并 / 兜底
pub mod engine;

// 配置层
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/表结构）
pub mod db;

// 性能观测（慢 SQL / 耗时守卫）
pub mod perf;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AggregationResult, CallerContext, DateRange, EntityKind, EquipmentData, FabId, FabRecord,
    LotData, Provenance, QueryFilter, ReturnHistory,
};

// 引擎
pub use engine::{
    AggregationService, DemoFallback, FanOutExecutor, QueryRouter, RecordAggregator,
    RecordCreator, ResultMerger,
};

// API
pub use api::{EquipmentApi, LotApi, ReturnApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "多厂区 MES 聚合系统";
