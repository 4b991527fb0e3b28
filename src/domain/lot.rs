// ==========================================
// 多厂区 MES 聚合系统 - 批次实体
// ==========================================

use crate::domain::query::QueryFilter;
use crate::domain::record::FabRecord;
use crate::domain::types::{lot_status, EntityKind, FabId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// LotData - 批次履历
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotData {
    pub id: String,
    pub lot_number: String,
    pub product: Option<String>,
    pub fab: FabId,
    pub status: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub step: Option<String>,
    pub equipment: Option<String>,
    /// 进度百分比 0..=100
    pub progress: Option<i32>,
    pub estimated_completion: Option<NaiveDateTime>,
    pub duration: Option<String>,
    pub result: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl FabRecord for LotData {
    const KIND: EntityKind = EntityKind::Lot;

    fn id(&self) -> &str {
        &self.id
    }

    fn fab(&self) -> FabId {
        self.fab
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn business_key(&self) -> &str {
        &self.lot_number
    }

    fn created_at(&self) -> Option<NaiveDateTime> {
        self.created_at
    }

    fn updated_at(&self) -> Option<NaiveDateTime> {
        self.updated_at
    }

    fn searchable_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.lot_number.as_str()];
        if let Some(product) = self.product.as_deref() {
            fields.push(product);
        }
        fields
    }

    fn matches_conditions(&self, filter: &QueryFilter) -> bool {
        filter.product().map_or(true, |p| self.product.as_deref() == Some(p))
            && filter
                .progress
                .map_or(true, |range| range.contains(self.progress.map(f64::from)))
    }

    // 在制 / 等待中的批次视为活动批次
    fn is_active(&self) -> bool {
        matches!(
            self.status.as_deref(),
            Some(lot_status::IN_PROGRESS) | Some(lot_status::WAITING)
        )
    }

    fn apply_status(&mut self, status: &str, now: NaiveDateTime) {
        self.status = Some(status.to_string());
        self.updated_at = Some(now);
    }
}
