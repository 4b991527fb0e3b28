// ==========================================
// 多厂区 MES 聚合系统 - 引擎层错误类型
// ==========================================
// 说明: 读路径上的聚合失败不返回给调用方，由服务层转为兜底数据；
//      写路径（新建 / 状态更新）的错误向上传递
// ==========================================

use crate::domain::types::{EntityKind, FabId};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 聚合层错误
#[derive(Error, Debug)]
pub enum AggregationError {
    /// 所有路由厂区均失败或超时
    #[error("所有厂区数据源均不可达: operation={operation}, fabs={fabs:?}, cause={cause}")]
    NoSourceReachable {
        operation: String,
        fabs: Vec<FabId>,
        cause: String,
    },

    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("无权访问厂区: {0}")]
    NotPermitted(FabId),

    #[error("路由未命中: {0}")]
    RoutingMiss(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("聚合内部错误: {0}")]
    Internal(String),
}

pub type AggregationOutcome<T> = Result<T, AggregationError>;
