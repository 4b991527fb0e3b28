// ==========================================
// 多厂区 MES 聚合系统 - 返工 API
// ==========================================
// 职责: 返工履历 / 检索 / 新建 / 状态流转
// 生命周期: analyzing → processing → resolved（转入 resolved 写入解决时间）
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::request::{NewReturnRequest, SearchRequest};
use crate::api::validator::{
    require_fab, require_non_blank, validate_entity_conditions, validate_query_filter,
};
use crate::domain::query::{AggregationResult, CallerContext};
use crate::domain::types::EntityKind;
use crate::domain::ReturnHistory;
use crate::engine::service::ReturnAggregator;

// ==========================================
// ReturnApi - 返工 API
// ==========================================
pub struct ReturnApi {
    service: Arc<dyn ReturnAggregator>,
}

impl ReturnApi {
    pub fn new(service: Arc<dyn ReturnAggregator>) -> Self {
        Self { service }
    }

    /// 返工履历
    ///
    /// # 参数
    /// - fab: 厂区（空 = 全部）
    /// - keyword: 可选关键字（返工编号 / 批次号 / 原因）
    pub async fn get_return_history(
        &self,
        fab: Option<&str>,
        keyword: Option<&str>,
        ctx: &CallerContext,
    ) -> ApiResult<AggregationResult<ReturnHistory>> {
        match keyword.map(str::trim).filter(|k| !k.is_empty()) {
            Some(keyword) => {
                let mut request = SearchRequest::keyword(keyword);
                request.fab = fab.map(str::to_string);
                self.search_returns(&request, ctx).await
            }
            None => Ok(self.service.get_history(fab, ctx).await),
        }
    }

    /// 未解决的返工
    pub async fn get_open_returns(
        &self,
        fab: Option<&str>,
        ctx: &CallerContext,
    ) -> ApiResult<AggregationResult<ReturnHistory>> {
        Ok(self.service.get_active_status(fab, ctx).await)
    }

    pub async fn get_return_details(
        &self,
        return_id: &str,
        ctx: &CallerContext,
    ) -> ApiResult<Option<ReturnHistory>> {
        let return_id = require_non_blank("返工编号", return_id)?;
        Ok(self.service.get_details(return_id, None, ctx).await)
    }

    /// 检索返工（关键字 / 厂区 / 状态 / 严重度 / 批次号 / 返工日期区间）
    pub async fn search_returns(
        &self,
        request: &SearchRequest,
        ctx: &CallerContext,
    ) -> ApiResult<AggregationResult<ReturnHistory>> {
        let filter = request.to_filter();
        validate_query_filter(&filter)?;
        validate_entity_conditions(EntityKind::Return, &filter)?;
        Ok(self.service.search(&filter, ctx).await)
    }

    /// 新建返工，写入请求中指定的厂区
    pub async fn create_return(
        &self,
        request: NewReturnRequest,
        ctx: &CallerContext,
    ) -> ApiResult<ReturnHistory> {
        require_non_blank("批次号", &request.lot_number)?;
        let fab = require_fab(request.fab.as_deref())?;

        let record = request.into_record(fab);
        Ok(self.service.create(record, ctx).await?)
    }

    /// 返工状态流转（按返工编号定位）
    pub async fn update_return_status(
        &self,
        return_id: &str,
        status: &str,
        fab: Option<&str>,
        ctx: &CallerContext,
    ) -> ApiResult<ReturnHistory> {
        let return_id = require_non_blank("返工编号", return_id)?;
        let status = require_non_blank("状态", status)?;
        Ok(self.service.update_status(return_id, status, fab, ctx).await?)
    }
}
