// ==========================================
// 多厂区 MES 聚合系统 - 应用层
// ==========================================
// 职责: 组装各层实例，供 CLI / 上层服务调用
// ==========================================

pub mod state;

// 重导出
pub use state::AppState;
