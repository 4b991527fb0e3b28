// ==========================================
// 多厂区 MES 聚合系统 - 请求参数校验
// ==========================================
// 职责: 在扇出前拒绝格式错误的查询条件（校验失败 → InvalidInput）
// 说明: 无法识别的 fab 不是校验错误，由路由按未命中处理
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::query::QueryFilter;
use crate::domain::types::{EntityKind, FabId};

/// 关键字最大长度（字符）
pub const MAX_KEYWORD_LEN: usize = 64;

/// 状态 / 严重度取值最大长度（字符）
pub const MAX_CODE_LEN: usize = 32;

/// 校验查询条件
pub fn validate_query_filter(filter: &QueryFilter) -> ApiResult<()> {
    if let Some(keyword) = filter.keyword() {
        if keyword.chars().count() > MAX_KEYWORD_LEN {
            return Err(ApiError::InvalidInput(format!(
                "关键字过长: 最多{}个字符",
                MAX_KEYWORD_LEN
            )));
        }
    }

    for (field, value) in [
        ("status", filter.status()),
        ("severity", filter.severity()),
        ("product", filter.product()),
        ("currentLot", filter.current_lot()),
        ("lotNumber", filter.lot_number()),
    ] {
        if let Some(value) = value {
            if value.chars().count() > MAX_CODE_LEN {
                return Err(ApiError::InvalidInput(format!("{}取值过长: {}", field, value)));
            }
        }
    }

    for (field, range) in [("date", &filter.date_range), ("returnDate", &filter.return_date_range)] {
        if let Some(range) = range {
            if !range.is_well_formed() {
                return Err(ApiError::InvalidInput(format!(
                    "{}区间无效: start={:?} 晚于 end={:?}",
                    field, range.start, range.end
                )));
            }
        }
    }

    for (field, range) in [
        ("progress", &filter.progress),
        ("utilization", &filter.utilization),
        ("temperature", &filter.temperature),
    ] {
        if let Some(range) = range {
            if !range.is_well_formed() {
                return Err(ApiError::InvalidInput(format!(
                    "{}区间无效: min={:?} max={:?}",
                    field, range.min, range.max
                )));
            }
        }
    }

    Ok(())
}

/// 拒绝不属于该实体的检索条件
pub fn validate_entity_conditions(kind: EntityKind, filter: &QueryFilter) -> ApiResult<()> {
    let present = [
        ("severity", filter.severity().is_some(), EntityKind::Return),
        ("lotNumber", filter.lot_number().is_some(), EntityKind::Return),
        ("returnDate", filter.return_date_range.is_some(), EntityKind::Return),
        ("product", filter.product().is_some(), EntityKind::Lot),
        ("progress", filter.progress.is_some(), EntityKind::Lot),
        ("utilization", filter.utilization.is_some(), EntityKind::Equipment),
        ("temperature", filter.temperature.is_some(), EntityKind::Equipment),
        ("currentLot", filter.current_lot().is_some(), EntityKind::Equipment),
    ];

    match present.iter().find(|(_, set, owner)| *set && *owner != kind) {
        Some((field, _, _)) => Err(ApiError::InvalidInput(format!(
            "{}检索不支持{}条件",
            kind, field
        ))),
        None => Ok(()),
    }
}

/// 必填字段校验
pub fn require_non_blank<'a>(field: &str, value: &'a str) -> ApiResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(trimmed)
}

/// 写操作必须指定可识别的厂区
pub fn require_fab(raw: Option<&str>) -> ApiResult<FabId> {
    let raw = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("厂区不能为空".to_string()))?;

    raw.parse::<FabId>()
        .map_err(|e| ApiError::InvalidInput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::DateRange;
    use chrono::NaiveDate;

    #[test]
    fn test_filter_validation() {
        assert!(validate_query_filter(&QueryFilter::default()).is_ok());

        let long = "x".repeat(MAX_KEYWORD_LEN + 1);
        let err = validate_query_filter(&QueryFilter::default().with_keyword(&long)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let inverted = QueryFilter::default().with_date_range(DateRange::new(Some(day(9)), Some(day(2))));
        assert!(validate_query_filter(&inverted).is_err());

        let open = QueryFilter::default().with_date_range(DateRange::new(Some(day(2)), None));
        assert!(validate_query_filter(&open).is_ok());
    }

    #[test]
    fn test_numeric_range_validation() {
        use crate::domain::query::NumericRange;

        let ok = QueryFilter::default().with_utilization(NumericRange::new(Some(50.0), Some(90.0)));
        assert!(validate_query_filter(&ok).is_ok());

        let inverted = QueryFilter::default().with_progress(NumericRange::new(Some(80.0), Some(20.0)));
        assert!(matches!(validate_query_filter(&inverted), Err(ApiError::InvalidInput(_))));

        let nan = QueryFilter::default().with_temperature(NumericRange::new(Some(f64::NAN), None));
        assert!(validate_query_filter(&nan).is_err());
    }

    #[test]
    fn test_entity_conditions() {
        use crate::domain::query::NumericRange;

        let severity = QueryFilter::default().with_severity("High");
        assert!(validate_entity_conditions(EntityKind::Return, &severity).is_ok());
        assert!(validate_entity_conditions(EntityKind::Lot, &severity).is_err());
        assert!(validate_entity_conditions(EntityKind::Equipment, &severity).is_err());

        let utilization = QueryFilter::default().with_utilization(NumericRange::new(Some(80.0), None));
        assert!(validate_entity_conditions(EntityKind::Equipment, &utilization).is_ok());
        assert!(matches!(
            validate_entity_conditions(EntityKind::Return, &utilization),
            Err(ApiError::InvalidInput(_))
        ));

        // 空白取值视为未指定
        let blank = QueryFilter::default().with_product("  ");
        assert!(validate_entity_conditions(EntityKind::Equipment, &blank).is_ok());
    }

    #[test]
    fn test_require_fab() {
        assert_eq!(require_fab(Some(" m14")).unwrap(), FabId::M14);
        assert!(matches!(require_fab(None), Err(ApiError::InvalidInput(_))));
        assert!(matches!(require_fab(Some("M99")), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_require_non_blank() {
        assert_eq!(require_non_blank("status", " resolved ").unwrap(), "resolved");
        assert!(require_non_blank("status", "  ").is_err());
    }
}
