//! SQLite 数据库工具：统一创建连接池
//!
//! 表结构的创建与种子数据写入由 `store::SchemaStore::open` 负责，
//! 这里只处理连接池本身；连接失败映射为 `StorageUnavailable`。

use crate::invite::error::{InviteError, Result};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

/// 创建 SQLite 连接池
pub async fn create_sqlite_pool(db_url: &str) -> Result<Pool<Sqlite>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .map_err(InviteError::StorageUnavailable)?;

    Ok(pool)
}

/// 创建单连接内存数据库（测试用）
///
/// `sqlite::memory:` 下每个连接是独立数据库，连接数必须限制为 1。
#[cfg(test)]
pub async fn create_memory_pool() -> Result<Pool<Sqlite>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .map_err(InviteError::StorageUnavailable)?;

    Ok(pool)
}
