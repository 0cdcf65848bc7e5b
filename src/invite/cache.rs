//! 邀请记录内存缓存
//!
//! 页面展示用的有序记录窗口：始终按时间戳倒序，只有最近一批
//! 新增记录带 isNew 标记。缓存不持有任何持久状态，页面加载时
//! 重建，每次刷新后增量合并，随时可以丢弃重建。

use crate::invite::error::Result;
use crate::invite::store::SchemaStore;
use crate::invite::types::InviteRecord;
use tracing::{debug, info};

/// 邀请记录缓存
#[derive(Default)]
pub struct InviteCache {
    records: Vec<InviteRecord>,
    initialized: bool,
}

impl InviteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否已初始化
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// 缓存中的记录总数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 丢弃当前内容，从存储加载最近 `count` 条记录并清除所有 isNew 标记
    pub async fn initialize(&mut self, store: &SchemaStore, count: u32) -> Result<()> {
        let mut records = store.get_invites(count).await?;
        for record in &mut records {
            record.is_new = false;
        }
        self.records = records;
        self.initialized = true;
        info!("[Cache] 邀请记录缓存已初始化: {} 条记录", self.records.len());
        Ok(())
    }

    /// 合并一批新记录
    ///
    /// 既有记录全部清除 isNew，新批次全部标记 isNew，批内按时间戳
    /// 倒序后整体前插。不做截断，截断由读取方通过 `get_records` 完成。
    pub fn add_records(&mut self, mut batch: Vec<InviteRecord>) {
        if batch.is_empty() {
            return;
        }

        for record in &mut self.records {
            record.is_new = false;
        }
        for record in &mut batch {
            record.is_new = true;
        }
        batch.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let added = batch.len();
        batch.append(&mut self.records);
        self.records = batch;

        debug!("[Cache] 缓存已更新: {} 条记录，新增 {} 条", self.records.len(), added);
    }

    /// 读取前 `count` 条记录，不改变缓存内容
    pub fn get_records(&self, count: usize) -> Vec<InviteRecord> {
        self.records.iter().take(count).cloned().collect()
    }

    /// 清除所有 isNew 标记
    pub fn clear_new_flags(&mut self) {
        for record in &mut self.records {
            record.is_new = false;
        }
    }
}
