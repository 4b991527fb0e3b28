// ==========================================
// 多厂区 MES 聚合系统 - 批次 API
// ==========================================
// 职责: 批次履历 / 活动批次 / 详情 / 检索 / 状态更新
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::request::SearchRequest;
use crate::api::validator::{require_non_blank, validate_entity_conditions, validate_query_filter};
use crate::domain::query::{AggregationResult, CallerContext};
use crate::domain::types::EntityKind;
use crate::domain::LotData;
use crate::engine::service::RecordAggregator;

// ==========================================
// LotApi - 批次 API
// ==========================================
pub struct LotApi {
    service: Arc<dyn RecordAggregator<LotData>>,
}

impl LotApi {
    pub fn new(service: Arc<dyn RecordAggregator<LotData>>) -> Self {
        Self { service }
    }

    /// 批次履历（fab 为空时汇总全部厂区）
    pub async fn get_lot_history(
        &self,
        fab: Option<&str>,
        ctx: &CallerContext,
    ) -> ApiResult<AggregationResult<LotData>> {
        Ok(self.service.get_history(fab, ctx).await)
    }

    /// 在制 / 等待中的批次
    pub async fn get_lot_status(
        &self,
        fab: Option<&str>,
        ctx: &CallerContext,
    ) -> ApiResult<AggregationResult<LotData>> {
        Ok(self.service.get_active_status(fab, ctx).await)
    }

    /// 按批次号查询详情
    ///
    /// # 返回
    /// - Ok(Some(LotData)): 找到
    /// - Ok(None): 未找到
    /// - Err(ApiError::InvalidInput): 批次号为空
    pub async fn get_lot_details(
        &self,
        lot_number: &str,
        ctx: &CallerContext,
    ) -> ApiResult<Option<LotData>> {
        let lot_number = require_non_blank("批次号", lot_number)?;
        Ok(self.service.get_details(lot_number, None, ctx).await)
    }

    /// 检索批次（关键字匹配批次号 / 产品）
    pub async fn search_lots(
        &self,
        request: &SearchRequest,
        ctx: &CallerContext,
    ) -> ApiResult<AggregationResult<LotData>> {
        let filter = request.to_filter();
        validate_query_filter(&filter)?;
        validate_entity_conditions(EntityKind::Lot, &filter)?;
        Ok(self.service.search(&filter, ctx).await)
    }

    /// 更新批次状态
    pub async fn update_lot_status(
        &self,
        lot_number: &str,
        status: &str,
        fab: Option<&str>,
        ctx: &CallerContext,
    ) -> ApiResult<LotData> {
        let lot_number = require_non_blank("批次号", lot_number)?;
        let status = require_non_blank("状态", status)?;
        Ok(self.service.update_status(lot_number, status, fab, ctx).await?)
    }
}
