// ==========================================
// 多厂区 MES 聚合系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::FabId;
use rusqlite::ErrorCode;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据源不可用（执行器据此隔离单个厂区） =====
    #[error("厂区数据源不可用: fab={fab}, reason={reason}")]
    SourceUnavailable { fab: FabId, reason: String },

    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    // ===== 数据质量错误 =====
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// 是否属于“数据源不可达”类错误
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            RepositoryError::SourceUnavailable { .. }
                | RepositoryError::DatabaseConnectionError(_)
                | RepositoryError::LockError(_)
        )
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, ref msg) => {
                let detail = msg.clone().unwrap_or_else(|| failure.to_string());
                match failure.code {
                    ErrorCode::CannotOpen
                    | ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::NotADatabase => RepositoryError::DatabaseConnectionError(detail),
                    _ if detail.contains("UNIQUE") => {
                        RepositoryError::UniqueConstraintViolation(detail)
                    }
                    _ => RepositoryError::DatabaseQueryError(detail),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unavailable_classification() {
        let err = RepositoryError::SourceUnavailable {
            fab: FabId::M15,
            reason: "connection refused".to_string(),
        };
        assert!(err.is_source_unavailable());
        assert!(err.to_string().contains("M15"));
        assert!(!RepositoryError::ValidationError("x".to_string()).is_source_unavailable());
    }

    #[test]
    fn test_missing_table_maps_to_query_error() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err: RepositoryError = conn
            .execute("DELETE FROM no_such_table", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepositoryError::DatabaseQueryError(_)));
    }
}
