// ==========================================
// 多厂区 MES 聚合系统 - API 层
// ==========================================
// 职责: 参数校验后委托聚合服务
// ==========================================

pub mod equipment_api;
pub mod error;
pub mod lot_api;
pub mod request;
pub mod return_api;
pub mod validator;

// 重导出核心类型
pub use equipment_api::EquipmentApi;
pub use error::{ApiError, ApiResult};
pub use lot_api::LotApi;
pub use request::{NewReturnRequest, SearchRequest};
pub use return_api::ReturnApi;
