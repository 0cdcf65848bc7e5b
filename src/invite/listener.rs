//! 刷新事件监听器
//!
//! 渲染层通过监听器接收刷新结果，回调数据统一为 JSON 字符串。

use async_trait::async_trait;

/// 刷新事件监听器
#[async_trait]
pub trait RefreshListener: Send + Sync {
    /// 一次下拉已提交，刷新开始
    async fn on_refresh_started(&self);

    /// 刷新完成，`records_json` 为本次新增记录的 JSON 数组
    async fn on_refresh_finished(&self, increment: u32, records_json: String);

    /// 刷新失败
    async fn on_refresh_failed(&self, reason: String);
}

/// 空监听器（默认实现，不做任何事）
pub struct EmptyRefreshListener;

#[async_trait]
impl RefreshListener for EmptyRefreshListener {
    async fn on_refresh_started(&self) {}
    async fn on_refresh_finished(&self, _increment: u32, _records_json: String) {}
    async fn on_refresh_failed(&self, _reason: String) {}
}
