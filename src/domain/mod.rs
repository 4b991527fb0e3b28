// ==========================================
// 多厂区 MES 聚合系统 - 领域模型层
// ==========================================
// 职责: 定义实体、类型、查询条件
// 红线: 不含数据访问逻辑,不含聚合逻辑
// ==========================================

pub mod equipment;
pub mod lot;
pub mod query;
pub mod record;
pub mod return_history;
pub mod types;

// 重导出核心类型
pub use equipment::EquipmentData;
pub use lot::LotData;
pub use query::{AggregationResult, CallerContext, DateRange, NumericRange, QueryFilter};
pub use record::FabRecord;
pub use return_history::ReturnHistory;
pub use types::{EntityKind, FabId, Provenance, UnknownFab};
