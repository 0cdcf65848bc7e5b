//! 邀请客户端：核心各组件的组装与对外门面
//!
//! 页面层只和这里打交道：统计数据、邀请列表（走缓存）、下拉刷新、
//! 提现、常见问题、用户信息与管理端配置写入。

use crate::invite::admin::AdminSettings;
use crate::invite::cache::InviteCache;
use crate::invite::error::{InviteError, Result};
use crate::invite::gesture::{GestureConfig, GestureController};
use crate::invite::listener::RefreshListener;
use crate::invite::refresh::RefreshEngine;
use crate::invite::store::SchemaStore;
use crate::invite::types::{
    config_key, FaqEntry, InviteRecord, RefreshOutcome, WithdrawalRecord, WithdrawalStatus,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// SQLite 数据库地址，如 `sqlite://invite_share.db?mode=rwc`
    pub db_url: String,
    /// 手势参数
    pub gesture: GestureConfig,
}

impl ClientConfig {
    pub fn new(db_url: impl Into<String>) -> Self {
        Self {
            db_url: db_url.into(),
            gesture: GestureConfig::default(),
        }
    }
}

/// 页面统计数据
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub today_count: i64,
    pub total_count: i64,
    pub invite_price: f64,
    pub today_earnings: f64,
    pub total_earnings: f64,
    pub invite_code: String,
}

/// 邀请客户端
pub struct InviteClient {
    store: Arc<SchemaStore>,
    cache: Arc<Mutex<InviteCache>>,
    engine: Arc<RefreshEngine>,
    gesture: GestureController,
}

impl InviteClient {
    /// 打开数据库并组装客户端，缓存按 `inviteDisplayCount` 预热
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let store = Arc::new(SchemaStore::open(&config.db_url).await?);
        Self::with_store(store, config.gesture).await
    }

    /// 基于已打开的存储组装客户端
    pub async fn with_store(store: Arc<SchemaStore>, gesture: GestureConfig) -> Result<Self> {
        let cache = Arc::new(Mutex::new(InviteCache::new()));
        let engine = Arc::new(RefreshEngine::new(Arc::clone(&store)));
        let controller =
            GestureController::with_config(Arc::clone(&engine), Arc::clone(&cache), gesture);

        let display_count = store
            .get_config_i64(config_key::INVITE_DISPLAY_COUNT)
            .await?
            .unwrap_or(10) as u32;
        cache
            .lock()
            .await
            .initialize(store.as_ref(), display_count)
            .await?;

        info!("[Client] 邀请客户端就绪，缓存预热 {} 条", display_count);
        Ok(Self {
            store,
            cache,
            engine,
            gesture: controller,
        })
    }

    /// 持久层
    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// 手势状态机
    pub fn gesture_mut(&mut self) -> &mut GestureController {
        &mut self.gesture
    }

    /// 设置刷新事件监听器
    pub fn set_refresh_listener(&mut self, listener: Arc<dyn RefreshListener>) {
        self.gesture.set_listener(listener);
    }

    /// 页面统计数据：今日/总人数与对应收益
    pub async fn stats(&self) -> Result<Stats> {
        let today_count = self
            .store
            .get_config_i64(config_key::TODAY_COUNT)
            .await?
            .unwrap_or(0);
        let total_count = self
            .store
            .get_config_i64(config_key::TOTAL_COUNT)
            .await?
            .unwrap_or(0);
        let invite_price = self
            .store
            .get_config_f64(config_key::INVITE_PRICE)
            .await?
            .unwrap_or(0.0);
        let invite_code = self
            .store
            .get_config_string(config_key::INVITE_CODE)
            .await?
            .unwrap_or_default();

        Ok(Stats {
            today_count,
            total_count,
            invite_price,
            today_earnings: today_count as f64 * invite_price,
            total_earnings: total_count as f64 * invite_price,
            invite_code,
        })
    }

    /// 从缓存读取展示用的邀请列表（最多 `inviteDisplayCount` 条）
    pub async fn recent_invites(&self) -> Result<Vec<InviteRecord>> {
        let display_count = self
            .store
            .get_config_i64(config_key::INVITE_DISPLAY_COUNT)
            .await?
            .unwrap_or(10) as usize;
        Ok(self.cache.lock().await.get_records(display_count))
    }

    /// 直接执行一次刷新（不经手势），结果合并进缓存
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let outcome = self.engine.run().await?;
        if outcome.increment > 0 {
            self.cache
                .lock()
                .await
                .add_records(outcome.new_invites.clone());
        }
        Ok(outcome)
    }

    /// 提交一笔提现
    ///
    /// 业务规则：先把既有处理中的记录全部置为已打款，再插入新记录，
    /// 因此任意时刻最多只有最新一笔处于处理中。
    pub async fn submit_withdrawal(
        &self,
        amount: f64,
        name: &str,
        account: &str,
    ) -> Result<WithdrawalRecord> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(InviteError::Validation(format!(
                "提现金额必须大于0: {}",
                amount
            )));
        }

        let paid = self.store.set_all_pending_to_paid().await?;
        if paid > 0 {
            info!("[Client] 提交新提现前，已有 {} 笔处理中记录置为已打款", paid);
        }

        self.store
            .add_withdrawal(WithdrawalRecord {
                id: 0,
                amount,
                name: name.to_string(),
                account: account.to_string(),
                timestamp: 0,
                status: WithdrawalStatus::Pending,
            })
            .await
    }

    /// 按时间倒序读取提现记录
    pub async fn withdrawals(&self, limit: u32) -> Result<Vec<WithdrawalRecord>> {
        self.store.get_withdrawals(limit).await
    }

    /// 常见问题列表
    pub async fn faqs(&self) -> Result<Vec<FaqEntry>> {
        self.store.get_faqs().await
    }

    /// 全部用户信息
    pub async fn user_info(&self) -> Result<HashMap<String, String>> {
        self.store.get_all_user_info().await
    }

    /// 管理端整体写入配置（校验不通过时不落库）
    pub async fn apply_admin_settings(&self, settings: &AdminSettings) -> Result<()> {
        settings.apply(self.store.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invite::db::create_memory_pool;
    use serde_json::json;

    async fn open_client() -> InviteClient {
        let pool = create_memory_pool().await.expect("创建内存数据库失败");
        let store = Arc::new(SchemaStore::from_pool(pool).await.expect("初始化失败"));
        InviteClient::with_store(store, GestureConfig::default())
            .await
            .expect("组装客户端失败")
    }

    #[tokio::test]
    async fn test_stats_match_seed_values() -> anyhow::Result<()> {
        let client = open_client().await;
        let stats = client.stats().await?;

        assert_eq!(stats.today_count, 3);
        assert_eq!(stats.total_count, 8653);
        assert!((stats.invite_price - 1.2).abs() < f64::EPSILON);
        assert!((stats.today_earnings - 3.6).abs() < 1e-9);
        assert!((stats.total_earnings - 8653.0 * 1.2).abs() < 1e-9);
        assert_eq!(stats.invite_code, "6985");
        Ok(())
    }

    #[tokio::test]
    async fn test_recent_invites_respects_display_count() -> anyhow::Result<()> {
        let client = open_client().await;
        // 种子 inviteDisplayCount = 6
        let records = client.recent_invites().await?;
        assert_eq!(records.len(), 6);
        assert!(records.iter().all(|r| !r.is_new));
        Ok(())
    }

    #[tokio::test]
    async fn test_withdrawal_keeps_single_pending() -> anyhow::Result<()> {
        let client = open_client().await;

        let first = client.submit_withdrawal(100.0, "张三", "622202xxxx").await?;
        assert_eq!(first.status, WithdrawalStatus::Pending);

        let second = client.submit_withdrawal(200.0, "张三", "622202xxxx").await?;
        assert_eq!(second.status, WithdrawalStatus::Pending);

        let records = client.withdrawals(10).await?;
        assert_eq!(records.len(), 2);
        let pending: Vec<_> = records
            .iter()
            .filter(|r| r.status == WithdrawalStatus::Pending)
            .collect();
        // 只有最新一笔处于处理中
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_withdrawal_rejects_non_positive_amount() {
        let client = open_client().await;
        assert!(matches!(
            client.submit_withdrawal(0.0, "张三", "622202xxxx").await,
            Err(InviteError::Validation(_))
        ));
        assert!(matches!(
            client.submit_withdrawal(-5.0, "张三", "622202xxxx").await,
            Err(InviteError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_merges_new_records_into_cache() -> anyhow::Result<()> {
        let client = open_client().await;
        // 必中新增 2 人
        client
            .store()
            .set_config(
                config_key::REFRESH_RULES,
                &json!([{ "increment": 2, "probability": 100 }]),
            )
            .await?;

        let outcome = client.refresh().await?;
        assert_eq!(outcome.increment, 2);

        let records = client.recent_invites().await?;
        assert_eq!(records.iter().filter(|r| r.is_new).count(), 2);
        Ok(())
    }
}
