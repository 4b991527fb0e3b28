// ==========================================
// 多厂区 MES 聚合系统 - 返工履历实体
// ==========================================
// 生命周期: analyzing → processing → resolved
// 只有转入 resolved 有副作用（写入 resolved_date）
// ==========================================

use crate::domain::query::QueryFilter;
use crate::domain::record::FabRecord;
use crate::domain::types::{return_status, EntityKind, FabId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ReturnHistory - 返工履历
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnHistory {
    pub id: String,
    pub return_id: String,
    pub lot_number: String,
    pub product: Option<String>,
    pub fab: FabId,
    pub return_reason: Option<String>,
    pub return_step: Option<String>,
    pub return_date: Option<NaiveDateTime>,
    pub return_by: Option<String>,
    pub target_step: Option<String>,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub resolved_date: Option<NaiveDateTime>,
    pub comments: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl FabRecord for ReturnHistory {
    const KIND: EntityKind = EntityKind::Return;

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
        &self.return_id
    }

    fn created_at(&self) -> Option<NaiveDateTime> {
        self.created_at
    }

    fn updated_at(&self) -> Option<NaiveDateTime> {
        self.updated_at
    }

    fn searchable_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.return_id.as_str(), self.lot_number.as_str()];
        if let Some(reason) = self.return_reason.as_deref() {
            fields.push(reason);
        }
        fields
    }

    fn severity(&self) -> Option<&str> {
        self.severity.as_deref()
    }

    fn matches_conditions(&self, filter: &QueryFilter) -> bool {
        filter.lot_number().map_or(true, |lot| self.lot_number == lot)
            && filter
                .return_date_range
                .map_or(true, |range| range.contains(self.return_date))
    }

    fn is_active(&self) -> bool {
        self.status.as_deref() != Some(return_status::RESOLVED)
    }

    fn apply_status(&mut self, status: &str, now: NaiveDateTime) {
        self.status = Some(status.to_string());
        self.updated_at = Some(now);
        if status == return_status::RESOLVED {
            self.resolved_date = Some(now);
        }
    }
}
