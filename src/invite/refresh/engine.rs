//! 刷新引擎：按权重规则模拟自然增长
//!
//! 一次 `run` 的流程：抢占守卫 → 读取规则与单价 → [0,100) 均匀抽签，
//! 按存储顺序累加概率选中首个 `r <= cum` 的规则 → 增量为 0 则不落库，
//! 否则先提交两个计数器，再逐条合成并插入邀请记录。
//!
//! 明细插入是尽力而为：单条失败记录日志后跳过，不重试也不回滚已
//! 提交的计数器，因此调用方不能假设 `new_invites.len() == increment`，
//! 聚合计数以配置表为准。守卫被占用时直接返回空结果，不排队。

use crate::invite::error::Result;
use crate::invite::refresh::guard::RefreshGuard;
use crate::invite::refresh::nickname::{random_avatar_color, random_nickname, synth_phone};
use crate::invite::store::{SchemaStore, DEFAULT_INVITE_PRICE};
use crate::invite::types::{config_key, InviteRecord, RefreshOutcome, RefreshRule};
use chrono::Utc;
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 按累积概率选中规则：首个 `draw <= cum` 的规则；
/// 概率和因舍入不足 100 时兜底取最后一条。空规则集返回 `None`。
pub fn pick_rule(rules: &[RefreshRule], draw: f64) -> Option<&RefreshRule> {
    let mut cum = 0.0;
    for rule in rules {
        cum += rule.probability;
        if draw <= cum {
            return Some(rule);
        }
    }
    rules.last()
}

/// 刷新引擎
pub struct RefreshEngine {
    store: Arc<SchemaStore>,
    guard: RefreshGuard,
}

impl RefreshEngine {
    pub fn new(store: Arc<SchemaStore>) -> Self {
        Self {
            store,
            guard: RefreshGuard::new(),
        }
    }

    /// 刷新互斥守卫
    pub fn guard(&self) -> &RefreshGuard {
        &self.guard
    }

    /// 执行一次刷新
    ///
    /// 守卫被占用时立即返回空结果，不做任何读写。
    pub async fn run(&self) -> Result<RefreshOutcome> {
        let Some(_token) = self.guard.try_acquire() else {
            info!("[Refresh] 已有刷新在进行中，忽略此次调用");
            return Ok(RefreshOutcome::empty());
        };

        // 令牌在本函数返回时析构，错误路径同样释放守卫
        self.run_guarded().await
    }

    /// 守卫内的刷新主体
    async fn run_guarded(&self) -> Result<RefreshOutcome> {
        let rules = match self.store.get_refresh_rules().await? {
            Some(rules) if !rules.is_empty() => rules,
            _ => {
                warn!("[Refresh] 刷新规则缺失或为空，跳过本次刷新");
                return Ok(RefreshOutcome::empty());
            }
        };

        let price = match self.store.get_config_f64(config_key::INVITE_PRICE).await? {
            Some(price) => price,
            None => {
                warn!("[Refresh] 邀请单价缺失，使用默认值 {}", DEFAULT_INVITE_PRICE);
                DEFAULT_INVITE_PRICE
            }
        };

        let draw = rand::thread_rng().gen_range(0.0..100.0);
        let Some(rule) = pick_rule(&rules, draw) else {
            return Ok(RefreshOutcome::empty());
        };
        let increment = rule.increment;
        info!("[Refresh] 抽签 r={:.2}，选中规则：新增 {} 人", draw, increment);

        if increment == 0 {
            return Ok(RefreshOutcome::empty());
        }

        self.apply_increment(increment, price).await
    }

    /// 提交计数器并逐条插入新邀请记录
    async fn apply_increment(&self, increment: u32, price: f64) -> Result<RefreshOutcome> {
        let today = self
            .store
            .get_config_i64(config_key::TODAY_COUNT)
            .await?
            .unwrap_or(0);
        let total = self
            .store
            .get_config_i64(config_key::TOTAL_COUNT)
            .await?
            .unwrap_or(0);

        self.store
            .set_config(config_key::TODAY_COUNT, &json!(today + increment as i64))
            .await?;
        self.store
            .set_config(config_key::TOTAL_COUNT, &json!(total + increment as i64))
            .await?;

        // 计数器已提交，此后的明细失败不回滚
        let mut new_invites = Vec::with_capacity(increment as usize);
        for _ in 0..increment {
            let record = {
                let mut rng = rand::thread_rng();
                InviteRecord {
                    id: 0,
                    name: random_nickname(&mut rng),
                    phone: synth_phone(&mut rng),
                    // 最近 1 分钟内
                    timestamp: Utc::now().timestamp_millis() - rng.gen_range(0..60_000),
                    avatar_color: random_avatar_color(&mut rng).to_string(),
                    amount: price,
                    is_new: false,
                }
            };

            match self.store.add_invite(record).await {
                Ok(stored) => {
                    info!("[Refresh] 已添加新邀请记录: {}", stored.name);
                    new_invites.push(stored);
                }
                Err(e) => {
                    error!("[Refresh] 添加邀请记录失败，跳过该条: {}", e);
                }
            }
        }

        info!(
            "[Refresh] 刷新完成：选中新增 {} 人，实际落库 {} 条",
            increment,
            new_invites.len()
        );
        Ok(RefreshOutcome {
            increment,
            new_invites,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invite::db::create_memory_pool;

    fn default_rules() -> Vec<RefreshRule> {
        vec![
            RefreshRule { increment: 0, probability: 50.0 },
            RefreshRule { increment: 1, probability: 30.0 },
            RefreshRule { increment: 2, probability: 15.0 },
            RefreshRule { increment: 3, probability: 5.0 },
        ]
    }

    async fn open_engine() -> RefreshEngine {
        let pool = create_memory_pool().await.expect("创建内存数据库失败");
        let store = SchemaStore::from_pool(pool).await.expect("初始化失败");
        RefreshEngine::new(Arc::new(store))
    }

    #[test]
    fn test_pick_rule_walks_cumulative_probability() {
        let rules = default_rules();
        // 累积概率 [50, 80, 95, 100]，抽到 62 应选中新增 1 人
        assert_eq!(pick_rule(&rules, 62.0).expect("规则缺失").increment, 1);
        assert_eq!(pick_rule(&rules, 0.0).expect("规则缺失").increment, 0);
        assert_eq!(pick_rule(&rules, 50.0).expect("规则缺失").increment, 0);
        assert_eq!(pick_rule(&rules, 50.01).expect("规则缺失").increment, 1);
        assert_eq!(pick_rule(&rules, 99.9).expect("规则缺失").increment, 3);
    }

    #[test]
    fn test_pick_rule_falls_back_to_last_on_drift() {
        // 概率和只有 99.8，抽到 99.9 时没有规则满足 r <= cum，兜底取最后一条
        let rules = vec![
            RefreshRule { increment: 0, probability: 49.9 },
            RefreshRule { increment: 1, probability: 49.9 },
        ];
        assert_eq!(pick_rule(&rules, 99.9).expect("规则缺失").increment, 1);
        assert_eq!(pick_rule(&[], 10.0), None);
    }

    #[test]
    fn test_pick_rule_sampling_converges() {
        let rules = default_rules();
        let mut rng = rand::thread_rng();
        let mut hits = [0u32; 4];
        let n = 10_000;

        for _ in 0..n {
            let draw = rng.gen_range(0.0..100.0);
            let rule = pick_rule(&rules, draw).expect("规则缺失");
            hits[rule.increment as usize] += 1;
        }

        for (i, rule) in rules.iter().enumerate() {
            let observed = hits[i] as f64 / n as f64 * 100.0;
            // 1.5 个百分点以内（约 3σ 之外）
            assert!(
                (observed - rule.probability).abs() < 1.5,
                "规则 {} 命中率 {:.2}%，期望 {:.2}%",
                i,
                observed,
                rule.probability
            );
        }
    }

    #[tokio::test]
    async fn test_run_rejected_while_guard_held() -> anyhow::Result<()> {
        let engine = open_engine().await;
        let today_before = engine
            .store
            .get_config_i64(config_key::TODAY_COUNT)
            .await?
            .unwrap_or(0);
        let invites_before = engine.store.get_invites(100).await?.len();

        let _token = engine.guard().try_acquire().expect("守卫抢占失败");
        let outcome = engine.run().await?;

        assert_eq!(outcome.increment, 0);
        assert!(outcome.new_invites.is_empty());
        // 被拒绝的调用不产生任何读写
        assert_eq!(
            engine.store.get_config_i64(config_key::TODAY_COUNT).await?,
            Some(today_before)
        );
        assert_eq!(engine.store.get_invites(100).await?.len(), invites_before);
        Ok(())
    }

    #[tokio::test]
    async fn test_guard_released_after_run() -> anyhow::Result<()> {
        let engine = open_engine().await;
        let _ = engine.run().await?;
        assert!(!engine.guard().is_held());
        let _ = engine.run().await?;
        assert!(!engine.guard().is_held());
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_increment_updates_counters_and_records() -> anyhow::Result<()> {
        let engine = open_engine().await;
        let before = Utc::now().timestamp_millis();

        // 种子值 todayCount=3, totalCount=8653
        let outcome = engine.apply_increment(2, 1.2).await?;

        assert_eq!(outcome.increment, 2);
        assert_eq!(outcome.new_invites.len(), 2);
        assert_eq!(
            engine.store.get_config_i64(config_key::TODAY_COUNT).await?,
            Some(5)
        );
        assert_eq!(
            engine.store.get_config_i64(config_key::TOTAL_COUNT).await?,
            Some(8655)
        );

        for record in &outcome.new_invites {
            assert!(record.id > 0);
            assert!((record.amount - 1.2).abs() < f64::EPSILON);
            // 时间戳在最近 60 秒内
            assert!(record.timestamp <= Utc::now().timestamp_millis());
            assert!(record.timestamp >= before - 60_000);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_run_keeps_counters_consistent() -> anyhow::Result<()> {
        let engine = open_engine().await;
        let outcome = engine.run().await?;

        let today = engine
            .store
            .get_config_i64(config_key::TODAY_COUNT)
            .await?
            .unwrap_or(0);
        let total = engine
            .store
            .get_config_i64(config_key::TOTAL_COUNT)
            .await?
            .unwrap_or(0);

        assert_eq!(today, 3 + outcome.increment as i64);
        assert_eq!(total, 8653 + outcome.increment as i64);
        assert!(outcome.new_invites.len() <= outcome.increment as usize);
        Ok(())
    }
}
