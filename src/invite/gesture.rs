//! 下拉刷新手势状态机
//!
//! 状态流转：Idle → Pulling → Armed → Refreshing → Cooldown → Idle。
//! 一次提交的下拉最多触发一次刷新；引擎调用结束后无论成败都进入
//! Cooldown，保证视觉与锁状态不会卡死。Cooldown 内忽略新的手势起点，
//! 到期后在下一次事件时回落为 Idle（惰性流转，便于无定时器测试）。

use crate::invite::cache::InviteCache;
use crate::invite::error::Result;
use crate::invite::listener::{EmptyRefreshListener, RefreshListener};
use crate::invite::refresh::RefreshEngine;
use crate::invite::types::RefreshOutcome;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// 手势状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    /// 空闲，唯一可以开启新一轮手势的状态
    Idle,
    /// 手势已开始，尚未达到视觉激活距离
    Pulling,
    /// 已超过视觉激活距离，松手即可能提交
    Armed,
    /// 刷新引擎调用中
    Refreshing,
    /// 刷新结束后的防抖窗口
    Cooldown,
}

/// 手势参数
#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// 视觉激活距离（px）
    pub activate_delta: f32,
    /// 提交阈值（px）
    pub commit_delta: f32,
    /// 下拉阻尼系数
    pub damping: f32,
    /// 视觉偏移上限（px）
    pub max_offset: f32,
    /// 刷新后的防抖窗口
    pub cooldown: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            activate_delta: 10.0,
            commit_delta: 50.0,
            damping: 0.4,
            max_offset: 60.0,
            cooldown: Duration::from_millis(2000),
        }
    }
}

/// 下拉刷新手势控制器
pub struct GestureController {
    config: GestureConfig,
    state: GestureState,
    start_y: f32,
    current_y: f32,
    has_moved: bool,
    cooldown_until: Option<Instant>,
    engine: Arc<RefreshEngine>,
    cache: Arc<Mutex<InviteCache>>,
    listener: Arc<dyn RefreshListener>,
}

impl GestureController {
    pub fn new(engine: Arc<RefreshEngine>, cache: Arc<Mutex<InviteCache>>) -> Self {
        Self::with_config(engine, cache, GestureConfig::default())
    }

    pub fn with_config(
        engine: Arc<RefreshEngine>,
        cache: Arc<Mutex<InviteCache>>,
        config: GestureConfig,
    ) -> Self {
        Self {
            config,
            state: GestureState::Idle,
            start_y: 0.0,
            current_y: 0.0,
            has_moved: false,
            cooldown_until: None,
            engine,
            cache,
            listener: Arc::new(EmptyRefreshListener),
        }
    }

    /// 设置刷新事件监听器
    pub fn set_listener(&mut self, listener: Arc<dyn RefreshListener>) {
        self.listener = listener;
    }

    /// 当前状态
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Cooldown 到期后回落为 Idle
    fn settle(&mut self) {
        if self.state == GestureState::Cooldown {
            let expired = self
                .cooldown_until
                .map(|until| Instant::now() >= until)
                .unwrap_or(true);
            if expired {
                debug!("[Gesture] 防抖窗口结束，回到 Idle");
                self.state = GestureState::Idle;
                self.cooldown_until = None;
            }
        }
    }

    /// 手势开始
    ///
    /// 只有在内容区处于顶部、状态为 Idle（含防抖窗口已到期）时才进入
    /// Pulling，其余情况忽略。
    pub fn touch_start(&mut self, y: f32, scroll_top: f32) {
        self.settle();

        if scroll_top > 0.0 {
            return;
        }
        if self.state != GestureState::Idle {
            debug!("[Gesture] 当前状态 {:?}，忽略手势起点", self.state);
            return;
        }

        self.start_y = y;
        self.current_y = y;
        self.has_moved = false;
        self.state = GestureState::Pulling;
    }

    /// 手势移动，超过激活距离后返回阻尼后的视觉偏移
    pub fn touch_move(&mut self, y: f32) -> Option<f32> {
        if !matches!(self.state, GestureState::Pulling | GestureState::Armed) {
            return None;
        }

        self.current_y = y;
        let delta = self.current_y - self.start_y;

        if delta > self.config.activate_delta {
            self.has_moved = true;
            self.state = GestureState::Armed;
            let offset = (delta * self.config.damping).min(self.config.max_offset);
            Some(offset)
        } else {
            None
        }
    }

    /// 手势结束
    ///
    /// 下拉距离超过提交阈值且守卫空闲时提交一次刷新；刷新结束后
    /// 无论成败都进入 Cooldown。低于阈值直接回到 Idle，视觉偏移清零。
    pub async fn touch_end(&mut self) -> Result<RefreshOutcome> {
        if !matches!(self.state, GestureState::Pulling | GestureState::Armed) {
            return Ok(RefreshOutcome::empty());
        }

        let delta = self.current_y - self.start_y;
        let committed =
            delta > self.config.commit_delta && self.has_moved && !self.engine.guard().is_held();

        self.has_moved = false;

        if !committed {
            debug!("[Gesture] 下拉距离 {:.1}px 未达阈值或守卫占用，取消", delta);
            self.state = GestureState::Idle;
            return Ok(RefreshOutcome::empty());
        }

        info!("[Gesture] 下拉 {:.1}px，提交刷新", delta);
        self.state = GestureState::Refreshing;
        self.listener.on_refresh_started().await;

        let result = self.engine.run().await;

        match &result {
            Ok(outcome) => {
                if outcome.increment > 0 {
                    let mut cache = self.cache.lock().await;
                    cache.add_records(outcome.new_invites.clone());
                }
                let records_json =
                    serde_json::to_string(&outcome.new_invites).unwrap_or_else(|_| "[]".to_string());
                self.listener
                    .on_refresh_finished(outcome.increment, records_json)
                    .await;
            }
            Err(e) => {
                warn!("[Gesture] 刷新失败: {}", e);
                self.listener.on_refresh_failed(e.to_string()).await;
            }
        }

        // 成败都进入防抖窗口，保证状态机不会卡在 Refreshing
        self.state = GestureState::Cooldown;
        self.cooldown_until = Some(Instant::now() + self.config.cooldown);

        result
    }
}
