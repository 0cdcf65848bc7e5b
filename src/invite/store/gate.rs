//! 事务门：单次调用的原子读写单元
//!
//! 每次存储调用对应一个工作单元，整体提交或整体失败，不产生半写。
//! 跨调用不提供原子性："改两个计数器再插 N 条明细"是多个独立提交的
//! 单元，明细插入中途失败时计数器不回滚，调用方以聚合计数为准。
//! 后续若要把计数器与明细合并为一次提交，扩展点就在这里。

use crate::invite::error::{InviteError, Result};
use sqlx::{Pool, Sqlite, SqliteConnection, Transaction};
use tracing::debug;

/// 事务门：从连接池开启工作单元
pub struct TransactionGate {
    db: Pool<Sqlite>,
}

impl TransactionGate {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 开启一个以 `op` 命名的工作单元
    pub async fn begin(&self, op: &'static str) -> Result<UnitOfWork> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| InviteError::transaction(op, e))?;
        debug!("[Gate] 开启工作单元: {}", op);
        Ok(UnitOfWork { op, txn })
    }
}

/// 单次调用的工作单元，未提交即析构则整体回滚
pub struct UnitOfWork {
    op: &'static str,
    txn: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    /// 工作单元内的连接
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.txn
    }

    /// 把单元内的底层错误映射为事务失败
    pub fn fail(&self, source: sqlx::Error) -> InviteError {
        InviteError::transaction(self.op, source)
    }

    /// 提交单元，消费自身
    pub async fn commit(self) -> Result<()> {
        let op = self.op;
        self.txn
            .commit()
            .await
            .map_err(|e| InviteError::transaction(op, e))?;
        debug!("[Gate] 工作单元提交完成: {}", op);
        Ok(())
    }
}
