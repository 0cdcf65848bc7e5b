//! 邀请核心 CLI（测试版）
//!
//! 非交互式 CLI，用于测试和展示邀请核心功能：
//! 统计数据、邀请列表、模拟下拉刷新、提现与管理端配置。

use anyhow::Result;
use chrono::{Local, TimeZone, Utc};
use clap::{Parser, Subcommand};
use invite_share_core_rust::invite::admin::AdminSettings;
use invite_share_core_rust::invite::types::{RefreshRule, WithdrawalStatus};
use invite_share_core_rust::{ClientConfig, InviteClient};
use tracing::info;

/// 邀请核心 CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "invite-cli")]
#[command(about = "邀请核心 CLI - 用于测试和展示本地存储与刷新模拟", long_about = None)]
struct Args {
    /// SQLite 数据库地址
    #[arg(long, default_value = "sqlite://invite_share.db?mode=rwc")]
    db: String,

    /// 日志级别（默认: info,invite_share_core_rust=debug）
    #[arg(long, default_value = "info,invite_share_core_rust=debug")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 显示统计数据
    Stats,
    /// 显示邀请列表（走缓存）
    Invites,
    /// 模拟一次完整的下拉刷新手势
    Pull,
    /// 提交一笔提现
    Withdraw {
        /// 提现金额
        #[arg(long)]
        amount: f64,
        /// 收款人姓名
        #[arg(long)]
        name: String,
        /// 收款账号
        #[arg(long)]
        account: String,
    },
    /// 显示提现记录
    Withdrawals {
        /// 最多显示条数
        #[arg(long, default_value = "50")]
        limit: u32,
    },
    /// 显示常见问题
    Faq,
    /// 显示全部配置
    ShowConfig,
    /// 管理端整体写入配置
    Admin {
        /// 邀请单价
        #[arg(long)]
        invite_price: f64,
        /// 今日新增
        #[arg(long)]
        today_count: i64,
        /// 总邀请人数
        #[arg(long)]
        total_count: i64,
        /// 邀请码
        #[arg(long)]
        invite_code: String,
        /// 邀请界面显示条数
        #[arg(long)]
        invite_display_count: u32,
        /// 刷新规则 JSON，如 '[{"increment":0,"probability":50},...]'
        #[arg(long)]
        rules: String,
    },
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("无法创建日志文件 debug.log");

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

/// 相对时间展示："刚刚"、"X分钟前"、"X小时前"、"X天前"或日期
fn format_relative_time(timestamp_millis: i64) -> String {
    let now = Utc::now().timestamp_millis();
    let diff_min = (now - timestamp_millis) / (60 * 1000);
    let diff_hour = (now - timestamp_millis) / (60 * 60 * 1000);
    let diff_day = (now - timestamp_millis) / (24 * 60 * 60 * 1000);

    if diff_min < 1 {
        "刚刚".to_string()
    } else if diff_min < 60 {
        format!("{}分钟前", diff_min)
    } else if diff_hour < 24 {
        format!("{}小时前", diff_hour)
    } else if diff_day < 30 {
        format!("{}天前", diff_day)
    } else {
        match Local.timestamp_millis_opt(timestamp_millis).single() {
            Some(dt) => dt.format("%Y-%m-%d").to_string(),
            None => "-".to_string(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level);

    info!("[CLI] 🚀 邀请核心 CLI");
    info!("[CLI] 💾 数据库: {}", args.db);

    let mut client = InviteClient::connect(ClientConfig::new(&args.db)).await?;

    match args.command {
        Command::Stats => {
            let stats = client.stats().await?;
            info!("[CLI] 📊 今日新增: {}", stats.today_count);
            info!("[CLI] 📊 总邀请人数: {}", stats.total_count);
            info!("[CLI] 📊 邀请单价: ¥{:.2}", stats.invite_price);
            info!("[CLI] 📊 今日收益: ¥{:.2}", stats.today_earnings);
            info!("[CLI] 📊 累计收益: ¥{:.2}", stats.total_earnings);
            info!("[CLI] 🔑 邀请码: {}", stats.invite_code);
        }
        Command::Invites => {
            let records = client.recent_invites().await?;
            info!("[CLI] 📋 邀请列表（共 {} 条）:", records.len());
            for record in records {
                info!(
                    "[CLI]   {} {} | {} | ¥{:.2} | {}",
                    if record.is_new { "🆕" } else { "  " },
                    record.name,
                    record.phone,
                    record.amount,
                    format_relative_time(record.timestamp)
                );
            }
        }
        Command::Pull => {
            // 模拟一次越过提交阈值的下拉：起点 y=100，拉到 y=170
            let gesture = client.gesture_mut();
            gesture.touch_start(100.0, 0.0);
            if let Some(offset) = gesture.touch_move(170.0) {
                info!("[CLI] 👇 下拉中，视觉偏移 {:.0}px", offset);
            }
            let outcome = gesture.touch_end().await?;

            if outcome.increment > 0 {
                info!("[CLI] ✅ 刷新成功，新增 {} 位用户", outcome.increment);
                for record in &outcome.new_invites {
                    info!("[CLI]   🆕 {} | {}", record.name, record.phone);
                }
            } else {
                info!("[CLI] ✅ 刷新成功");
            }
        }
        Command::Withdraw {
            amount,
            name,
            account,
        } => {
            let record = client.submit_withdrawal(amount, &name, &account).await?;
            info!(
                "[CLI] 💰 提现申请已提交: id={}, 金额 ¥{:.2}，状态: 处理中",
                record.id, record.amount
            );
        }
        Command::Withdrawals { limit } => {
            let records = client.withdrawals(limit).await?;
            info!("[CLI] 📋 提现记录（共 {} 条）:", records.len());
            for record in records {
                let status = match record.status {
                    WithdrawalStatus::Pending => "处理中",
                    WithdrawalStatus::Paid => "已打款",
                    WithdrawalStatus::Rejected => "已驳回",
                };
                info!(
                    "[CLI]   ¥{:.2} | {} | {} | {}",
                    record.amount,
                    record.name,
                    status,
                    format_relative_time(record.timestamp)
                );
            }
        }
        Command::Faq => {
            for faq in client.faqs().await? {
                info!("[CLI] ❓ {}", faq.question);
                info!("[CLI]    {}", faq.answer);
            }
        }
        Command::ShowConfig => {
            let configs = client.store().get_all_config().await?;
            for (key, value) in configs {
                info!("[CLI] ⚙️  {} = {}", key, value);
            }
        }
        Command::Admin {
            invite_price,
            today_count,
            total_count,
            invite_code,
            invite_display_count,
            rules,
        } => {
            let refresh_rules: Vec<RefreshRule> = serde_json::from_str(&rules)
                .map_err(|e| anyhow::anyhow!("刷新规则 JSON 解析失败: {}", e))?;
            let settings = AdminSettings {
                invite_price,
                today_count,
                total_count,
                invite_code,
                invite_display_count,
                refresh_rules,
            };
            client.apply_admin_settings(&settings).await?;
            info!(
                "[CLI] ✅ 设置保存成功！共保存了 {} 条规则",
                settings.refresh_rules.len()
            );
        }
    }

    Ok(())
}
