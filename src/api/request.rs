// ==========================================
// 多厂区 MES 聚合系统 - 请求对象
// ==========================================

use crate::domain::query::{DateRange, NumericRange, QueryFilter};
use crate::domain::types::FabId;
use crate::domain::ReturnHistory;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// SearchRequest - 检索请求
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub keyword: Option<String>,
    pub fab: Option<String>,
    pub status: Option<String>,
    /// 仅返工检索支持
    pub severity: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,

    // ===== 批次 =====
    pub product: Option<String>,
    pub progress: Option<NumericRange>,

    // ===== 设备 =====
    pub utilization: Option<NumericRange>,
    pub temperature: Option<NumericRange>,
    pub current_lot: Option<String>,

    // ===== 返工 =====
    pub lot_number: Option<String>,
    pub return_start: Option<NaiveDateTime>,
    pub return_end: Option<NaiveDateTime>,
}

fn date_range(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Option<DateRange> {
    if start.is_some() || end.is_some() {
        Some(DateRange::new(start, end))
    } else {
        None
    }
}

impl SearchRequest {
    pub fn keyword(keyword: &str) -> Self {
        Self {
            keyword: Some(keyword.to_string()),
            ..Self::default()
        }
    }

    pub fn with_fab(mut self, fab: &str) -> Self {
        self.fab = Some(fab.to_string());
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn with_severity(mut self, severity: &str) -> Self {
        self.severity = Some(severity.to_string());
        self
    }

    pub fn with_range(mut self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_product(mut self, product: &str) -> Self {
        self.product = Some(product.to_string());
        self
    }

    pub fn with_progress(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.progress = Some(NumericRange::new(min, max));
        self
    }

    pub fn with_utilization(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.utilization = Some(NumericRange::new(min, max));
        self
    }

    pub fn with_temperature(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.temperature = Some(NumericRange::new(min, max));
        self
    }

    pub fn with_current_lot(mut self, current_lot: &str) -> Self {
        self.current_lot = Some(current_lot.to_string());
        self
    }

    pub fn with_lot_number(mut self, lot_number: &str) -> Self {
        self.lot_number = Some(lot_number.to_string());
        self
    }

    pub fn with_return_range(
        mut self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Self {
        self.return_start = start;
        self.return_end = end;
        self
    }

    pub fn to_filter(&self) -> QueryFilter {
        QueryFilter {
            fab: self.fab.clone(),
            keyword: self.keyword.clone(),
            status: self.status.clone(),
            severity: self.severity.clone(),
            date_range: date_range(self.start, self.end),
            product: self.product.clone(),
            progress: self.progress,
            utilization: self.utilization,
            temperature: self.temperature,
            current_lot: self.current_lot.clone(),
            lot_number: self.lot_number.clone(),
            return_date_range: date_range(self.return_start, self.return_end),
        }
    }
}

// ==========================================
// NewReturnRequest - 新建返工请求
// ==========================================
/// id / 返工编号 / 时间戳由聚合层生成；status 按调用方提供的值写入（不设默认值）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReturnRequest {
    pub lot_number: String,
    pub product: Option<String>,
    pub fab: Option<String>,
    pub return_reason: Option<String>,
    pub return_step: Option<String>,
    pub return_by: Option<String>,
    pub target_step: Option<String>,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub comments: Option<String>,
}

impl NewReturnRequest {
    /// 转换为待写入的返工记录（fab 需已校验）
    pub fn into_record(self, fab: FabId) -> ReturnHistory {
        ReturnHistory {
            id: String::new(),
            return_id: String::new(),
            lot_number: self.lot_number.trim().to_string(),
            product: self.product,
            fab,
            return_reason: self.return_reason,
            return_step: self.return_step,
            return_date: None,
            return_by: self.return_by,
            target_step: self.target_step,
            status: self.status,
            severity: self.severity,
            resolved_date: None,
            comments: self.comments,
            created_at: None,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_to_filter() {
        let req = SearchRequest::keyword("RET-00").with_status("resolved");
        let filter = req.to_filter();
        assert_eq!(filter.keyword(), Some("RET-00"));
        assert_eq!(filter.status(), Some("resolved"));
        assert_eq!(filter.fab(), None);
        assert!(filter.date_range.is_none());
        assert!(filter.return_date_range.is_none());
    }

    #[test]
    fn test_entity_conditions_deserialize_camel_case() {
        let json = r#"{"utilization":{"min":80.0,"max":null},"currentLot":"LOT002","returnStart":"2025-03-01T00:00:00"}"#;
        let req: SearchRequest = serde_json::from_str(json).unwrap();
        let filter = req.to_filter();
        assert_eq!(filter.utilization, Some(NumericRange::new(Some(80.0), None)));
        assert_eq!(filter.current_lot(), Some("LOT002"));
        let range = filter.return_date_range.unwrap();
        assert!(range.start.is_some());
        assert!(range.end.is_none());
    }

    #[test]
    fn test_new_return_request_deserializes_camel_case() {
        let json = r#"{"lotNumber":"LOT009","fab":"M15","status":"analyzing","severity":"Low"}"#;
        let req: NewReturnRequest = serde_json::from_str(json).unwrap();
        let record = req.into_record(FabId::M15);
        assert_eq!(record.lot_number, "LOT009");
        assert_eq!(record.status.as_deref(), Some("analyzing"));
        assert!(record.created_at.is_none());
    }
}
