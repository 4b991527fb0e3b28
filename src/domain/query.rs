// ==========================================
// 多厂区 MES 聚合系统 - 查询条件与结果
// ==========================================

use crate::domain::types::{FabId, Provenance};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// DateRange - 时间区间（闭区间，按 created_at 过滤）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// 起点不晚于终点
    pub fn is_well_formed(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }

    /// 缺失时间戳的记录不落入任何有界区间
    pub fn contains(&self, ts: Option<NaiveDateTime>) -> bool {
        if self.start.is_none() && self.end.is_none() {
            return true;
        }
        let Some(ts) = ts else {
            return false;
        };
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

// ==========================================
// NumericRange - 数值区间（闭区间，边界可缺省）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_well_formed(&self) -> bool {
        let finite = |v: Option<f64>| v.map_or(true, f64::is_finite);
        if !finite(self.min) || !finite(self.max) {
            return false;
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }

    /// 缺失数值的记录不落入任何有界区间
    pub fn contains(&self, value: Option<f64>) -> bool {
        if self.min.is_none() && self.max.is_none() {
            return true;
        }
        let Some(value) = value else {
            return false;
        };
        self.min.map_or(true, |m| value >= m) && self.max.map_or(true, |m| value <= m)
    }
}

// ==========================================
// QueryFilter - 逻辑查询条件
// ==========================================
/// fab 保留原始字符串，由 QueryRouter 解释（缺省 = 全部厂区）
///
/// 空字符串等同于未指定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    pub fab: Option<String>,
    pub keyword: Option<String>,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub date_range: Option<DateRange>,

    // ===== 批次条件 =====
    pub product: Option<String>,
    pub progress: Option<NumericRange>,

    // ===== 设备条件 =====
    pub utilization: Option<NumericRange>,
    pub temperature: Option<NumericRange>,
    pub current_lot: Option<String>,

    // ===== 返工条件 =====
    pub lot_number: Option<String>,
    pub return_date_range: Option<DateRange>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl QueryFilter {
    pub fn for_fab(fab: Option<&str>) -> Self {
        Self {
            fab: fab.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_keyword(mut self, keyword: &str) -> Self {
        self.keyword = Some(keyword.to_string());
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

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_product(mut self, product: &str) -> Self {
        self.product = Some(product.to_string());
        self
    }

    pub fn with_progress(mut self, range: NumericRange) -> Self {
        self.progress = Some(range);
        self
    }

    pub fn with_utilization(mut self, range: NumericRange) -> Self {
        self.utilization = Some(range);
        self
    }

    pub fn with_temperature(mut self, range: NumericRange) -> Self {
        self.temperature = Some(range);
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

    pub fn with_return_date_range(mut self, range: DateRange) -> Self {
        self.return_date_range = Some(range);
        self
    }

    pub fn fab(&self) -> Option<&str> {
        non_blank(&self.fab)
    }

    pub fn keyword(&self) -> Option<&str> {
        non_blank(&self.keyword)
    }

    pub fn status(&self) -> Option<&str> {
        non_blank(&self.status)
    }

    pub fn severity(&self) -> Option<&str> {
        non_blank(&self.severity)
    }

    pub fn product(&self) -> Option<&str> {
        non_blank(&self.product)
    }

    pub fn current_lot(&self) -> Option<&str> {
        non_blank(&self.current_lot)
    }

    pub fn lot_number(&self) -> Option<&str> {
        non_blank(&self.lot_number)
    }
}

// ==========================================
// CallerContext - 调用方身份
// ==========================================
/// 显式传入的调用方身份与厂区授权范围
///
/// permitted_fabs 为 None 表示不限制
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub user: String,
    pub permitted_fabs: Option<BTreeSet<FabId>>,
}

impl CallerContext {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            permitted_fabs: None,
        }
    }

    /// 内部任务使用的系统身份
    pub fn system() -> Self {
        Self::new("system")
    }

    pub fn with_permitted_fabs<I: IntoIterator<Item = FabId>>(mut self, fabs: I) -> Self {
        self.permitted_fabs = Some(fabs.into_iter().collect());
        self
    }

    pub fn permits(&self, fab: FabId) -> bool {
        self.permitted_fabs
            .as_ref()
            .map_or(true, |set| set.contains(&fab))
    }
}

// ==========================================
// AggregationResult - 聚合结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult<T> {
    /// 已按 created_at 倒序排列
    pub records: Vec<T>,
    pub provenance: Provenance,
    /// 本次查询中失败/超时、贡献空结果的厂区
    pub degraded_fabs: Vec<FabId>,
}

impl<T> AggregationResult<T> {
    pub fn live(records: Vec<T>, degraded_fabs: Vec<FabId>) -> Self {
        Self {
            records,
            provenance: Provenance::Live,
            degraded_fabs,
        }
    }

    pub fn fallback(records: Vec<T>, degraded_fabs: Vec<FabId>) -> Self {
        Self {
            records,
            provenance: Provenance::Fallback,
            degraded_fabs,
        }
    }

    pub fn empty() -> Self {
        Self::live(Vec::new(), Vec::new())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::Fallback
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let range = DateRange::new(Some(ts(2)), Some(ts(4)));
        assert!(range.contains(Some(ts(2))));
        assert!(range.contains(Some(ts(4))));
        assert!(!range.contains(Some(ts(5))));
        assert!(!range.contains(None));
        assert!(DateRange::default().contains(None));
    }

    #[test]
    fn test_numeric_range_bounds() {
        let range = NumericRange::new(Some(20.0), Some(80.0));
        assert!(range.contains(Some(20.0)));
        assert!(range.contains(Some(80.0)));
        assert!(!range.contains(Some(80.5)));
        assert!(!range.contains(None));
        assert!(NumericRange::new(None, Some(10.0)).contains(Some(-3.0)));

        assert!(!NumericRange::new(Some(5.0), Some(1.0)).is_well_formed());
        assert!(!NumericRange::new(Some(f64::NAN), None).is_well_formed());
    }

    #[test]
    fn test_blank_filter_fields_are_absent() {
        let filter = QueryFilter::for_fab(Some("  ")).with_keyword("").with_status(" resolved ");
        assert_eq!(filter.fab(), None);
        assert_eq!(filter.keyword(), None);
        assert_eq!(filter.status(), Some("resolved"));
    }

    #[test]
    fn test_caller_context_permits() {
        let ctx = CallerContext::new("kim").with_permitted_fabs([FabId::M14]);
        assert!(ctx.permits(FabId::M14));
        assert!(!ctx.permits(FabId::M16));
        assert!(CallerContext::system().permits(FabId::M16));
    }
}
