//! 管理端配置写入
//!
//! 接收整体替换的规则列表与四个标量配置，落库前校验，
//! 校验不通过直接拒绝，已有配置不受影响。
//! 校验通过后的写入是多次独立提交（与存储层其余路径一致）。

use crate::invite::error::{InviteError, Result};
use crate::invite::store::SchemaStore;
use crate::invite::types::{config_key, RefreshRule};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// 规则概率之和相对 100 的允许误差（百分点）
pub const PROBABILITY_SUM_TOLERANCE: f64 = 0.5;

/// 管理端一次性提交的全部配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub invite_price: f64,
    pub today_count: i64,
    pub total_count: i64,
    pub invite_code: String,
    pub invite_display_count: u32,
    pub refresh_rules: Vec<RefreshRule>,
}

impl AdminSettings {
    /// 校验全部字段，任何一项不合法都拒绝
    pub fn validate(&self) -> Result<()> {
        if !self.invite_price.is_finite() || self.invite_price < 0.0 {
            return Err(InviteError::Validation(format!(
                "邀请单价不合法: {}",
                self.invite_price
            )));
        }
        if self.today_count < 0 || self.total_count < 0 {
            return Err(InviteError::Validation("计数不能为负".to_string()));
        }
        if self.invite_code.trim().is_empty() {
            return Err(InviteError::Validation("邀请码不能为空".to_string()));
        }
        if self.invite_display_count < 1 {
            return Err(InviteError::Validation(
                "邀请界面显示条数必须大于0".to_string(),
            ));
        }
        if self.refresh_rules.is_empty() {
            return Err(InviteError::Validation("至少需要一条刷新规则".to_string()));
        }

        let mut total_probability = 0.0;
        for rule in &self.refresh_rules {
            if !rule.probability.is_finite() || rule.probability < 0.0 {
                return Err(InviteError::Validation(format!(
                    "规则概率不合法: {}",
                    rule.probability
                )));
            }
            total_probability += rule.probability;
        }

        // 允许 0.5 个百分点的误差，不要收紧
        if (total_probability - 100.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(InviteError::Validation(format!(
                "所有规则的概率之和必须接近100%，当前总和为{}%",
                total_probability
            )));
        }

        Ok(())
    }

    /// 校验并整体写入配置
    pub async fn apply(&self, store: &SchemaStore) -> Result<()> {
        self.validate()?;

        store
            .set_config(config_key::INVITE_PRICE, &json!(self.invite_price))
            .await?;
        store
            .set_config(config_key::TODAY_COUNT, &json!(self.today_count))
            .await?;
        store
            .set_config(config_key::TOTAL_COUNT, &json!(self.total_count))
            .await?;
        store
            .set_config(config_key::INVITE_CODE, &json!(self.invite_code))
            .await?;
        store
            .set_config(
                config_key::INVITE_DISPLAY_COUNT,
                &json!(self.invite_display_count),
            )
            .await?;
        store
            .set_config(
                config_key::REFRESH_RULES,
                &serde_json::to_value(&self.refresh_rules)
                    .map_err(|e| InviteError::Validation(format!("规则序列化失败: {}", e)))?,
            )
            .await?;

        info!(
            "[Admin] 配置保存成功，共 {} 条规则",
            self.refresh_rules.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invite::db::create_memory_pool;

    fn valid_settings() -> AdminSettings {
        AdminSettings {
            invite_price: 2.5,
            today_count: 10,
            total_count: 9000,
            invite_code: "8888".to_string(),
            invite_display_count: 8,
            refresh_rules: vec![
                RefreshRule { increment: 0, probability: 60.0 },
                RefreshRule { increment: 1, probability: 40.0 },
            ],
        }
    }

    async fn open_store() -> SchemaStore {
        let pool = create_memory_pool().await.expect("创建内存数据库失败");
        SchemaStore::from_pool(pool).await.expect("初始化失败")
    }

    #[tokio::test]
    async fn test_apply_persists_all_keys() -> anyhow::Result<()> {
        let store = open_store().await;
        valid_settings().apply(&store).await?;

        assert_eq!(
            store.get_config_f64(config_key::INVITE_PRICE).await?,
            Some(2.5)
        );
        assert_eq!(store.get_config_i64(config_key::TODAY_COUNT).await?, Some(10));
        assert_eq!(
            store.get_config_i64(config_key::TOTAL_COUNT).await?,
            Some(9000)
        );
        assert_eq!(
            store.get_config_string(config_key::INVITE_CODE).await?,
            Some("8888".to_string())
        );
        assert_eq!(
            store.get_config_i64(config_key::INVITE_DISPLAY_COUNT).await?,
            Some(8)
        );
        let rules = store.get_refresh_rules().await?.expect("规则缺失");
        assert_eq!(rules.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_probability_sum_leaves_config_untouched() -> anyhow::Result<()> {
        let store = open_store().await;

        let mut settings = valid_settings();
        settings.refresh_rules = vec![
            RefreshRule { increment: 0, probability: 60.0 },
            RefreshRule { increment: 1, probability: 30.0 },
        ];

        let err = settings.apply(&store).await.unwrap_err();
        assert!(matches!(err, InviteError::Validation(_)));

        // 原有配置原样保留
        assert_eq!(
            store.get_config_f64(config_key::INVITE_PRICE).await?,
            Some(1.2)
        );
        assert_eq!(store.get_refresh_rules().await?.expect("规则缺失").len(), 4);
        Ok(())
    }

    #[test]
    fn test_probability_tolerance_boundary() {
        let mut settings = valid_settings();

        // 99.6 在 ±0.5 容差内
        settings.refresh_rules = vec![
            RefreshRule { increment: 0, probability: 60.0 },
            RefreshRule { increment: 1, probability: 39.6 },
        ];
        assert!(settings.validate().is_ok());

        // 100.6 超出容差
        settings.refresh_rules = vec![
            RefreshRule { increment: 0, probability: 60.0 },
            RefreshRule { increment: 1, probability: 40.6 },
        ];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_invalid_fields() {
        let mut settings = valid_settings();
        settings.invite_code = "  ".to_string();
        assert!(settings.validate().is_err());

        let mut settings = valid_settings();
        settings.invite_display_count = 0;
        assert!(settings.validate().is_err());

        let mut settings = valid_settings();
        settings.refresh_rules.clear();
        assert!(settings.validate().is_err());

        let mut settings = valid_settings();
        settings.refresh_rules[0].probability = -1.0;
        assert!(settings.validate().is_err());

        let mut settings = valid_settings();
        settings.invite_price = f64::NAN;
        assert!(settings.validate().is_err());
    }
}
