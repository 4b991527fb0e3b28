// ==========================================
// 多厂区 MES 聚合系统 - 记录抽象
// ==========================================
// 职责: 批次/设备/返工三类记录的统一视图
// 说明: 聚合层只通过此 trait 读取记录，不关心具体实体
// ==========================================

use crate::domain::query::QueryFilter;
use crate::domain::types::{EntityKind, FabId};
use chrono::NaiveDateTime;

/// 厂区记录
///
/// 不变量:
/// - `created_at <= updated_at`（两者均存在时）
/// - `fab()` 等于产出该记录的数据源所属厂区
pub trait FabRecord: Clone + Send + Sync + 'static {
    /// 实体种类
    const KIND: EntityKind;

    /// 记录唯一标识（仅在厂区内唯一）
    fn id(&self) -> &str;

    fn fab(&self) -> FabId;

    fn status(&self) -> Option<&str>;

    /// 业务主键（批次号 / 设备ID / 返工ID）
    fn business_key(&self) -> &str;

    fn created_at(&self) -> Option<NaiveDateTime>;

    fn updated_at(&self) -> Option<NaiveDateTime>;

    /// 关键字检索字段（业务主键 + 名称/原因等）
    fn searchable_fields(&self) -> Vec<&str>;

    /// 严重度（仅返工记录有）
    fn severity(&self) -> Option<&str> {
        None
    }

    /// 实体专属条件（批次: 产品 / 进度；设备: 稼动率 / 温度 / 当前批次；返工: 批次号 / 返工日期）
    ///
    /// 不属于本实体的条件忽略
    fn matches_conditions(&self, _filter: &QueryFilter) -> bool {
        true
    }

    /// 是否处于非终态
    fn is_active(&self) -> bool;

    /// 写入新状态并刷新 updated_at
    fn apply_status(&mut self, status: &str, now: NaiveDateTime);
}

/// 校验时间戳不变量
pub fn timestamps_consistent<T: FabRecord>(record: &T) -> bool {
    match (record.created_at(), record.updated_at()) {
        (Some(created), Some(updated)) => created <= updated,
        _ => true,
    }
}
