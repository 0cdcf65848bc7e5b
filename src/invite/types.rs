//! 邀请核心公共数据结构
//!
//! 与页面层交换的 JSON 均为 camelCase，字段命名沿用持久层约定。

use serde::{Deserialize, Serialize};

/// 配置表键名
pub mod config_key {
    /// 邀请单价
    pub const INVITE_PRICE: &str = "invitePrice";
    /// 今日新增
    pub const TODAY_COUNT: &str = "todayCount";
    /// 总邀请人数
    pub const TOTAL_COUNT: &str = "totalCount";
    /// 邀请码
    pub const INVITE_CODE: &str = "inviteCode";
    /// 邀请界面显示条数
    pub const INVITE_DISPLAY_COUNT: &str = "inviteDisplayCount";
    /// 下拉刷新规则
    pub const REFRESH_RULES: &str = "refreshRules";
}

/// 用户信息表键名
pub mod user_info_key {
    pub const AVATAR_URL: &str = "avatarUrl";
    pub const USERNAME: &str = "username";
    pub const MEMBER_TYPE: &str = "memberType";
}

/// 下拉刷新规则：一次刷新新增 `increment` 人的概率为 `probability`（百分点）
///
/// 规则集的概率之和应接近 100，容差 ±0.5，仅在整体替换规则时校验。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshRule {
    /// 新增人数（非负）
    pub increment: u32,
    /// 命中概率（百分点，非负）
    pub probability: f64,
}

/// 邀请记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRecord {
    /// 存储层分配的自增 ID，插入前为 0
    #[serde(default)]
    pub id: i64,
    /// 昵称
    pub name: String,
    /// 手机号（合成的展示用号码）
    pub phone: String,
    /// 毫秒时间戳
    pub timestamp: i64,
    /// 头像背景色
    pub avatar_color: String,
    /// 单条奖励金额
    pub amount: f64,
    /// 是否为本次刷新新增（仅缓存层标注，不落库）
    #[serde(default)]
    pub is_new: bool,
}

/// 提现状态
///
/// 状态只允许 Pending→Paid 或 Pending→Rejected，不允许回退。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WithdrawalStatus {
    /// 处理中
    Pending,
    /// 已打款
    Paid,
    /// 已驳回
    Rejected,
}

impl WithdrawalStatus {
    /// 持久层存储的状态字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Paid => "paid",
            WithdrawalStatus::Rejected => "rejected",
        }
    }

    /// 从持久层字符串解析，未知值按处理中对待
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "paid" => WithdrawalStatus::Paid,
            "rejected" => WithdrawalStatus::Rejected,
            _ => WithdrawalStatus::Pending,
        }
    }
}

/// 提现记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRecord {
    /// 存储层分配的自增 ID，插入前为 0
    #[serde(default)]
    pub id: i64,
    /// 提现金额（必须大于 0）
    pub amount: f64,
    /// 收款人姓名
    pub name: String,
    /// 收款账号
    pub account: String,
    /// 毫秒时间戳
    pub timestamp: i64,
    /// 提现状态
    pub status: WithdrawalStatus,
}

/// 常见问题条目（运行时只读）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
}

/// 一次刷新的结果
///
/// 并发拒绝与增量为 0 都返回空结果。计数器写入先于明细插入，
/// 明细单条失败会被跳过，因此 `new_invites.len()` 可能小于 `increment`。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    /// 本次选中的新增人数
    pub increment: u32,
    /// 实际成功落库的新增记录
    pub new_invites: Vec<InviteRecord>,
}

impl RefreshOutcome {
    /// 空结果（未选中增长或刷新被并发拒绝）
    pub fn empty() -> Self {
        Self {
            increment: 0,
            new_invites: Vec::new(),
        }
    }
}
