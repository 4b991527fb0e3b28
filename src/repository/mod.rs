// ==========================================
// 多厂区 MES 聚合系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 每个厂区库的数据访问（厂区数据源适配器）
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod adapter;
pub mod equipment_repo;
pub mod error;
pub mod fab_repo;
pub mod lot_repo;
pub mod return_repo;

// 重导出核心仓储
pub use adapter::{FabSourceAdapter, UnavailableSource};
pub use equipment_repo::EquipmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use fab_repo::{RecordTable, SqliteFabRepository};
pub use lot_repo::LotRepository;
pub use return_repo::ReturnRepository;
