// ==========================================
// 多厂区 MES 聚合系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将仓储/聚合错误转换为调用方可理解的错误
// 说明: 读路径不会产生这些错误（聚合层已降级或兜底），
//      只有参数校验失败和写操作会走到这里
// ==========================================

use crate::engine::error::AggregationError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无访问权限: {0}")]
    Forbidden(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("厂区数据源不可用: {0}")]
    SourceUnavailable(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::SourceUnavailable { fab, reason } => {
                ApiError::SourceUnavailable(format!("{}: {}", fab, reason))
            }
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 AggregationError 转换
// ==========================================
impl From<AggregationError> for ApiError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            AggregationError::NotPermitted(fab) => ApiError::Forbidden(format!("厂区 {}", fab)),
            AggregationError::RoutingMiss(reason) => ApiError::InvalidInput(reason),
            AggregationError::NoSourceReachable { fabs, cause, .. } => {
                ApiError::SourceUnavailable(format!("{:?}: {}", fabs, cause))
            }
            AggregationError::Repository(err) => err.into(),
            AggregationError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{EntityKind, FabId};

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "return".to_string(),
            id: "r-1".to_string(),
        };
        match ApiError::from(repo_err) {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("return"));
                assert!(msg.contains("r-1"));
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let repo_err = RepositoryError::SourceUnavailable {
            fab: FabId::M16,
            reason: "timeout".to_string(),
        };
        assert!(matches!(ApiError::from(repo_err), ApiError::SourceUnavailable(msg) if msg.contains("M16")));
    }

    #[test]
    fn test_aggregation_error_conversion() {
        let err = AggregationError::NotFound {
            entity: EntityKind::Equipment,
            id: "7".to_string(),
        };
        assert!(matches!(ApiError::from(err), ApiError::NotFound(_)));

        let err = AggregationError::NotPermitted(FabId::M14);
        assert!(matches!(ApiError::from(err), ApiError::Forbidden(_)));

        let err = AggregationError::Repository(RepositoryError::UniqueConstraintViolation(
            "return_history.id".to_string(),
        ));
        assert!(matches!(ApiError::from(err), ApiError::BusinessRuleViolation(_)));
    }
}
