// ==========================================
// 多厂区 MES 聚合系统 - 厂区数据源适配器
// ==========================================
// 职责: 定义聚合层依赖的数据源接口（每厂区、每实体一个实例）
// 红线: 适配器不含聚合逻辑，只负责单库数据访问
// ==========================================

use crate::domain::query::{DateRange, QueryFilter};
use crate::domain::record::FabRecord;
use crate::domain::types::FabId;
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::marker::PhantomData;

// ==========================================
// FabSourceAdapter Trait
// ==========================================
/// 厂区数据源适配器
///
/// 所有操作均可失败；数据源不可达时返回
/// `RepositoryError::SourceUnavailable`（或其他 `is_source_unavailable()` 错误），
/// 由扇出执行器按厂区隔离。
pub trait FabSourceAdapter<T: FabRecord>: Send + Sync {
    /// 适配器所属厂区
    fn fab(&self) -> FabId;

    fn select_all(&self) -> RepositoryResult<Vec<T>>;

    /// 按业务主键精确查询
    fn select_by_key(&self, key: &str) -> RepositoryResult<Vec<T>>;

    fn select_by_fab(&self, fab: FabId) -> RepositoryResult<Vec<T>>;

    fn select_by_status(&self, status: &str) -> RepositoryResult<Vec<T>>;

    fn select_by_date_range(&self, range: &DateRange) -> RepositoryResult<Vec<T>>;

    /// 关键字模糊查询（任一检索字段包含关键字）
    fn select_matching(&self, keyword: &str) -> RepositoryResult<Vec<T>>;

    /// 非终态记录（默认全量读取后按 `is_active` 过滤）
    fn select_active(&self) -> RepositoryResult<Vec<T>> {
        Ok(self
            .select_all()?
            .into_iter()
            .filter(|r| r.is_active())
            .collect())
    }

    /// 实体专属条件下推（严重度 / 数值区间 / 批次号等）
    ///
    /// 返回 None 表示该数据源无法下推 filter 中的任何实体条件
    fn select_by_conditions(&self, _filter: &QueryFilter) -> Option<RepositoryResult<Vec<T>>> {
        None
    }

    fn insert(&self, record: &T) -> RepositoryResult<()>;

    fn update(&self, record: &T) -> RepositoryResult<()>;
}

// ==========================================
// UnavailableSource - 不可达数据源
// ==========================================
/// 启动时无法打开厂区库时的占位适配器
///
/// 每次调用都返回 SourceUnavailable，使该厂区在扇出中表现为失败厂区
pub struct UnavailableSource<T> {
    fab: FabId,
    reason: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> UnavailableSource<T> {
    pub fn new(fab: FabId, reason: impl Into<String>) -> Self {
        Self {
            fab,
            reason: reason.into(),
            _record: PhantomData,
        }
    }

    fn unavailable(&self) -> RepositoryError {
        RepositoryError::SourceUnavailable {
            fab: self.fab,
            reason: self.reason.clone(),
        }
    }
}

impl<T: FabRecord> FabSourceAdapter<T> for UnavailableSource<T> {
    fn fab(&self) -> FabId {
        self.fab
    }

    fn select_all(&self) -> RepositoryResult<Vec<T>> {
        Err(self.unavailable())
    }

    fn select_by_key(&self, _key: &str) -> RepositoryResult<Vec<T>> {
        Err(self.unavailable())
    }

    fn select_by_fab(&self, _fab: FabId) -> RepositoryResult<Vec<T>> {
        Err(self.unavailable())
    }

    fn select_by_status(&self, _status: &str) -> RepositoryResult<Vec<T>> {
        Err(self.unavailable())
    }

    fn select_by_date_range(&self, _range: &DateRange) -> RepositoryResult<Vec<T>> {
        Err(self.unavailable())
    }

    fn select_matching(&self, _keyword: &str) -> RepositoryResult<Vec<T>> {
        Err(self.unavailable())
    }

    fn insert(&self, _record: &T) -> RepositoryResult<()> {
        Err(self.unavailable())
    }

    fn update(&self, _record: &T) -> RepositoryResult<()> {
        Err(self.unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LotData;

    #[test]
    fn test_unavailable_source_always_fails() {
        let source: UnavailableSource<LotData> = UnavailableSource::new(FabId::M16, "db missing");
        assert_eq!(FabSourceAdapter::<LotData>::fab(&source), FabId::M16);

        let err = source.select_all().unwrap_err();
        assert!(err.is_source_unavailable());
        assert!(source.select_by_key("LOT001").is_err());
        assert!(source.select_active().is_err());
    }
}
