//! 邀请数据访问层（DAO）
//!
//! 五张表：config（配置）、invites（邀请记录）、withdrawals（提现记录）、
//! user_info（用户信息）、faq（常见问题）。建表与种子数据仅在首次打开时
//! 执行，由 `PRAGMA user_version` 把关（0 = 未初始化，1 = 当前版本）。
//! 配置值以 JSON 文本落库，键缺失时返回 `None` 而不是错误。

use crate::invite::db::create_sqlite_pool;
use crate::invite::error::{InviteError, Result};
use crate::invite::refresh::nickname::{random_avatar_color, synth_phone};
use crate::invite::store::gate::{TransactionGate, UnitOfWork};
use crate::invite::types::{
    config_key, user_info_key, FaqEntry, InviteRecord, RefreshRule, WithdrawalRecord,
    WithdrawalStatus,
};
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};
use sqlx::{Pool, Row, Sqlite};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// 当前 schema 版本
const SCHEMA_VERSION: i64 = 1;

/// 种子邀请记录的昵称池（微信风格）
const SEED_NICKNAMES: [&str; 20] = [
    "小可爱😊",
    "阳光男孩",
    "微笑🌸",
    "快乐每一天",
    "幸福如意",
    "Amy123",
    "Bob",
    "Cathy🍀",
    "David888",
    "Emma",
    "😎酷酷的我",
    "🌟星星点灯",
    "✨闪闪惹人爱",
    "🌈彩虹糖果",
    "🌸樱花雨",
    "李明",
    "王小花",
    "张大山",
    "刘晓华",
    "陈志远",
];

/// 默认常见问题
const SEED_FAQS: [(&str, &str); 4] = [
    (
        "如何邀请好友?",
        "您可以在邀请页面获取您的专属邀请码，将邀请码分享给好友。好友成功注册后，您将获得相应奖励。",
    ),
    (
        "提现有什么要求?",
        "可提现金额达到100元后可申请提现，提现申请会在1-3个工作日内审核处理。",
    ),
    (
        "邀请奖励如何计算?",
        "每成功邀请一位新用户，您将获得相应的邀请奖励。具体奖励金额 = 新增用户数 × 单价。",
    ),
    (
        "如何修改个人信息?",
        "在\"我的\"页面点击\"设置\"，可以修改您的头像和用户名等个人信息。",
    ),
];

/// 邀请单价种子值，刷新引擎在配置缺失时也以此兜底
pub const DEFAULT_INVITE_PRICE: f64 = 1.2;

/// 持久层入口：五张表的读写与一次性初始化
pub struct SchemaStore {
    db: Pool<Sqlite>,
    gate: TransactionGate,
}

impl SchemaStore {
    /// 打开数据库并按需完成建表与种子数据写入（幂等）
    pub async fn open(db_url: &str) -> Result<Self> {
        info!("[Store] 打开数据库: {}", db_url);
        let db = create_sqlite_pool(db_url).await?;
        Self::from_pool(db).await
    }

    /// 基于已有连接池构建（测试与共享池场景）
    pub async fn from_pool(db: Pool<Sqlite>) -> Result<Self> {
        let store = Self {
            gate: TransactionGate::new(db.clone()),
            db,
        };
        store.init_schema().await?;
        Ok(store)
    }

    /// 底层连接池
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.db
    }

    /// 首次打开时建表并写入种子数据，之后的打开是空操作
    async fn init_schema(&self) -> Result<()> {
        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&self.db)
            .await
            .map_err(|e| InviteError::transaction("读取 schema 版本", e))?;

        if version >= SCHEMA_VERSION {
            debug!("[Store] schema 已是版本 {}，跳过初始化", version);
            return Ok(());
        }

        info!("[Store] 首次打开，初始化 schema（版本 {} -> {}）", version, SCHEMA_VERSION);
        let mut uow = self.gate.begin("初始化数据库").await?;

        for sql in [
            r#"
            CREATE TABLE IF NOT EXISTS config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS invites (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                phone TEXT NOT NULL DEFAULT '',
                timestamp INTEGER NOT NULL,
                avatar_color TEXT NOT NULL DEFAULT '',
                amount REAL NOT NULL DEFAULT 0
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_invites_timestamp ON invites (timestamp)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS withdrawals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                account TEXT NOT NULL DEFAULT '',
                timestamp INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_withdrawals_timestamp ON withdrawals (timestamp)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS user_info (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS faq (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                answer TEXT NOT NULL
            )
            "#,
        ] {
            sqlx::query(sql)
                .execute(uow.conn())
                .await
                .map_err(|e| uow.fail(e))?;
        }

        Self::seed_config(&mut uow).await?;
        Self::seed_invites(&mut uow).await?;
        Self::seed_user_info(&mut uow).await?;
        Self::seed_faqs(&mut uow).await?;

        sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
            .execute(uow.conn())
            .await
            .map_err(|e| uow.fail(e))?;

        uow.commit().await?;
        info!("[Store] schema 初始化完成");
        Ok(())
    }

    /// 写入默认配置
    async fn seed_config(uow: &mut UnitOfWork) -> Result<()> {
        let defaults: [(&str, Value); 6] = [
            (config_key::INVITE_PRICE, json!(DEFAULT_INVITE_PRICE)),
            (config_key::TODAY_COUNT, json!(3)),
            (config_key::TOTAL_COUNT, json!(8653)),
            (config_key::INVITE_CODE, json!("6985")),
            (config_key::INVITE_DISPLAY_COUNT, json!(6)),
            (
                config_key::REFRESH_RULES,
                json!([
                    { "increment": 0, "probability": 50 },
                    { "increment": 1, "probability": 30 },
                    { "increment": 2, "probability": 15 },
                    { "increment": 3, "probability": 5 }
                ]),
            ),
        ];

        for (key, value) in defaults {
            sqlx::query("INSERT INTO config (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(value.to_string())
                .execute(uow.conn())
                .await
                .map_err(|e| uow.fail(e))?;
        }
        Ok(())
    }

    /// 生成 20 条初始邀请记录，时间戳落在最近 10 天内
    async fn seed_invites(uow: &mut UnitOfWork) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        let one_day: i64 = 24 * 60 * 60 * 1000;

        // 先整体生成，避免随机数生成器跨越 await 点
        let seeds: Vec<(&str, String, i64, &str)> = {
            let mut rng = rand::thread_rng();
            (0..20)
                .map(|_| {
                    (
                        SEED_NICKNAMES[rng.gen_range(0..SEED_NICKNAMES.len())],
                        synth_phone(&mut rng),
                        now - rng.gen_range(0..10) * one_day,
                        random_avatar_color(&mut rng),
                    )
                })
                .collect()
        };

        for (name, phone, timestamp, color) in seeds {
            sqlx::query(
                r#"
                INSERT INTO invites (name, phone, timestamp, avatar_color, amount)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(name)
            .bind(phone)
            .bind(timestamp)
            .bind(color)
            .bind(DEFAULT_INVITE_PRICE)
            .execute(uow.conn())
            .await
            .map_err(|e| uow.fail(e))?;
        }
        Ok(())
    }

    /// 写入默认用户信息（头像为空，随机用户名，普通会员）
    async fn seed_user_info(uow: &mut UnitOfWork) -> Result<()> {
        let username = format!("用户{}", rand::thread_rng().gen_range(1000..10000));
        let defaults: [(&str, String); 3] = [
            (user_info_key::AVATAR_URL, String::new()),
            (user_info_key::USERNAME, username),
            (user_info_key::MEMBER_TYPE, "普通会员".to_string()),
        ];

        for (key, value) in defaults {
            sqlx::query("INSERT INTO user_info (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(uow.conn())
                .await
                .map_err(|e| uow.fail(e))?;
        }
        Ok(())
    }

    /// 写入默认常见问题
    async fn seed_faqs(uow: &mut UnitOfWork) -> Result<()> {
        for (question, answer) in SEED_FAQS {
            sqlx::query("INSERT INTO faq (question, answer) VALUES (?, ?)")
                .bind(question)
                .bind(answer)
                .execute(uow.conn())
                .await
                .map_err(|e| uow.fail(e))?;
        }
        Ok(())
    }

    // ========== 配置 ==========

    /// 读取单个配置值，键缺失返回 `None`
    pub async fn get_config(&self, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT value FROM config WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| InviteError::transaction("读取配置", e))?;

        match row {
            Some(row) => {
                let raw: String = row.get("value");
                let value: Value = serde_json::from_str(&raw).unwrap_or_else(|e| {
                    warn!("[Store] 配置 {} 的 JSON 解析失败: {}，按字符串处理", key, e);
                    Value::String(raw)
                });
                debug!("[Store] 读取配置 {} = {}", key, value);
                Ok(Some(value))
            }
            None => {
                debug!("[Store] 配置 {} 不存在", key);
                Ok(None)
            }
        }
    }

    /// 写入单个配置值（存在则覆盖）
    pub async fn set_config(&self, key: &str, value: &Value) -> Result<()> {
        let mut uow = self.gate.begin("写入配置").await?;
        sqlx::query(
            r#"
            INSERT INTO config (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value.to_string())
        .execute(uow.conn())
        .await
        .map_err(|e| uow.fail(e))?;
        uow.commit().await?;
        debug!("[Store] 写入配置 {} = {}", key, value);
        Ok(())
    }

    /// 读取全部配置
    pub async fn get_all_config(&self) -> Result<HashMap<String, Value>> {
        let rows = sqlx::query("SELECT key, value FROM config")
            .fetch_all(&self.db)
            .await
            .map_err(|e| InviteError::transaction("读取全部配置", e))?;

        let mut configs = HashMap::new();
        for row in rows {
            let key: String = row.get("key");
            let raw: String = row.get("value");
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            configs.insert(key, value);
        }
        Ok(configs)
    }

    /// 读取浮点配置
    pub async fn get_config_f64(&self, key: &str) -> Result<Option<f64>> {
        Ok(self.get_config(key).await?.and_then(|v| v.as_f64()))
    }

    /// 读取整数配置
    pub async fn get_config_i64(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.get_config(key).await?.and_then(|v| v.as_i64()))
    }

    /// 读取字符串配置
    pub async fn get_config_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get_config(key)
            .await?
            .and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    /// 读取下拉刷新规则列表
    pub async fn get_refresh_rules(&self) -> Result<Option<Vec<RefreshRule>>> {
        match self.get_config(config_key::REFRESH_RULES).await? {
            Some(value) => match serde_json::from_value::<Vec<RefreshRule>>(value) {
                Ok(rules) => Ok(Some(rules)),
                Err(e) => {
                    warn!("[Store] 刷新规则解析失败: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    // ========== 邀请记录 ==========

    /// 新增邀请记录：缺失的时间戳补为当前时间，返回带 ID 的完整记录
    pub async fn add_invite(&self, mut record: InviteRecord) -> Result<InviteRecord> {
        if record.timestamp == 0 {
            record.timestamp = Utc::now().timestamp_millis();
        }
        // isNew 只属于缓存层，落库前抹掉
        record.is_new = false;

        let mut uow = self.gate.begin("新增邀请记录").await?;
        let result = sqlx::query(
            r#"
            INSERT INTO invites (name, phone, timestamp, avatar_color, amount)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.name)
        .bind(&record.phone)
        .bind(record.timestamp)
        .bind(&record.avatar_color)
        .bind(record.amount)
        .execute(uow.conn())
        .await
        .map_err(|e| uow.fail(e))?;
        uow.commit().await?;

        record.id = result.last_insert_rowid();
        debug!("[Store] 新增邀请记录: id={}, name={}", record.id, record.name);
        Ok(record)
    }

    /// 按时间倒序读取最多 `limit` 条邀请记录
    ///
    /// 插入顺序不可依赖，排序以时间戳为准，同一时间戳按 ID 倒序。
    pub async fn get_invites(&self, limit: u32) -> Result<Vec<InviteRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, phone, timestamp, avatar_color, amount
            FROM invites
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .map_err(|e| InviteError::transaction("读取邀请记录", e))?;

        let invites: Vec<InviteRecord> = rows
            .into_iter()
            .map(|row| InviteRecord {
                id: row.get("id"),
                name: row.get("name"),
                phone: row.get("phone"),
                timestamp: row.get("timestamp"),
                avatar_color: row.get("avatar_color"),
                amount: row.get("amount"),
                is_new: false,
            })
            .collect();

        debug!("[Store] 读取邀请记录，共 {} 条", invites.len());
        Ok(invites)
    }

    // ========== 提现记录 ==========

    /// 新增提现记录：默认状态为处理中，缺失的时间戳补为当前时间
    pub async fn add_withdrawal(&self, mut record: WithdrawalRecord) -> Result<WithdrawalRecord> {
        if record.timestamp == 0 {
            record.timestamp = Utc::now().timestamp_millis();
        }

        let mut uow = self.gate.begin("新增提现记录").await?;
        let result = sqlx::query(
            r#"
            INSERT INTO withdrawals (amount, name, account, timestamp, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.amount)
        .bind(&record.name)
        .bind(&record.account)
        .bind(record.timestamp)
        .bind(record.status.as_str())
        .execute(uow.conn())
        .await
        .map_err(|e| uow.fail(e))?;
        uow.commit().await?;

        record.id = result.last_insert_rowid();
        info!(
            "[Store] 新增提现记录: id={}, amount={}, status={}",
            record.id,
            record.amount,
            record.status.as_str()
        );
        Ok(record)
    }

    /// 按时间倒序读取最多 `limit` 条提现记录
    pub async fn get_withdrawals(&self, limit: u32) -> Result<Vec<WithdrawalRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, amount, name, account, timestamp, status
            FROM withdrawals
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .map_err(|e| InviteError::transaction("读取提现记录", e))?;

        let withdrawals = rows
            .into_iter()
            .map(|row| WithdrawalRecord {
                id: row.get("id"),
                amount: row.get("amount"),
                name: row.get("name"),
                account: row.get("account"),
                timestamp: row.get("timestamp"),
                status: WithdrawalStatus::from_str_lossy(row.get("status")),
            })
            .collect();

        Ok(withdrawals)
    }

    /// 将所有处理中的提现记录批量置为已打款，返回更新条数
    pub async fn set_all_pending_to_paid(&self) -> Result<u64> {
        let mut uow = self.gate.begin("批量更新提现状态").await?;
        let result = sqlx::query("UPDATE withdrawals SET status = 'paid' WHERE status = 'pending'")
            .execute(uow.conn())
            .await
            .map_err(|e| uow.fail(e))?;
        uow.commit().await?;

        let count = result.rows_affected();
        info!("[Store] 提现状态批量更新完成，共 {} 条", count);
        Ok(count)
    }

    // ========== 用户信息 ==========

    /// 读取单项用户信息，键缺失返回 `None`
    pub async fn get_user_info(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM user_info WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| InviteError::transaction("读取用户信息", e))?;

        Ok(row.map(|row| row.get("value")))
    }

    /// 写入单项用户信息
    pub async fn set_user_info(&self, key: &str, value: &str) -> Result<()> {
        let mut uow = self.gate.begin("写入用户信息").await?;
        sqlx::query(
            r#"
            INSERT INTO user_info (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(uow.conn())
        .await
        .map_err(|e| uow.fail(e))?;
        uow.commit().await?;
        Ok(())
    }

    /// 读取全部用户信息
    pub async fn get_all_user_info(&self) -> Result<HashMap<String, String>> {
        let rows = sqlx::query("SELECT key, value FROM user_info")
            .fetch_all(&self.db)
            .await
            .map_err(|e| InviteError::transaction("读取全部用户信息", e))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("key"), row.get("value")))
            .collect())
    }

    // ========== 常见问题 ==========

    /// 读取常见问题列表
    pub async fn get_faqs(&self) -> Result<Vec<FaqEntry>> {
        let rows = sqlx::query("SELECT id, question, answer FROM faq ORDER BY id")
            .fetch_all(&self.db)
            .await
            .map_err(|e| InviteError::transaction("读取常见问题", e))?;

        Ok(rows
            .into_iter()
            .map(|row| FaqEntry {
                id: row.get("id"),
                question: row.get("question"),
                answer: row.get("answer"),
            })
            .collect())
    }
}
