//! 错误类型定义
//!
//! 按失败类别划分：存储不可用（打开/初始化失败，整体致命）、
//! 事务失败（单次读写失败，调用方处理，不自动重试）、
//! 配置校验失败（管理端写入前拒绝，不落库）。
//! 刷新引擎的并发拒绝不是错误，表现为空结果，见 `refresh::engine`。

use thiserror::Error;

/// 邀请核心统一错误类型
#[derive(Debug, Error)]
pub enum InviteError {
    /// 底层存储无法打开或初始化
    #[error("存储不可用: {0}")]
    StorageUnavailable(#[source] sqlx::Error),

    /// 单次事务读写失败
    #[error("事务失败（{op}）: {source}")]
    TransactionFailure {
        /// 失败的操作描述
        op: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// 配置校验失败（写入前拒绝，已有配置不受影响）
    #[error("配置校验失败: {0}")]
    Validation(String),
}

impl InviteError {
    /// 将 sqlx 错误包装为事务失败
    pub fn transaction(op: &'static str, source: sqlx::Error) -> Self {
        Self::TransactionFailure { op, source }
    }
}

pub type Result<T> = std::result::Result<T, InviteError>;
