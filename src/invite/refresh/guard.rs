//! 刷新互斥守卫
//!
//! 全局唯一的"刷新中"标记。`try_acquire` 原子抢占，占用中直接失败
//! 而不是排队；令牌在析构时释放，任何退出路径（成功、错误、提前
//! 返回）都不会把守卫留在占用状态。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 刷新互斥守卫
#[derive(Clone, Default)]
pub struct RefreshGuard {
    busy: Arc<AtomicBool>,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试占用守卫，已被占用时返回 `None`
    pub fn try_acquire(&self) -> Option<GuardToken> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            debug!("[Guard] 守卫已占用");
            Some(GuardToken {
                busy: Arc::clone(&self.busy),
            })
        } else {
            debug!("[Guard] 守卫占用失败，已有刷新在进行");
            None
        }
    }

    /// 当前是否被占用
    pub fn is_held(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// 守卫令牌，析构即释放
pub struct GuardToken {
    busy: Arc<AtomicBool>,
}

impl Drop for GuardToken {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        debug!("[Guard] 守卫已释放");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let guard = RefreshGuard::new();
        let token = guard.try_acquire();
        assert!(token.is_some());
        assert!(guard.is_held());
        assert!(guard.try_acquire().is_none());
        drop(token);
        assert!(!guard.is_held());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_release_on_early_exit() {
        let guard = RefreshGuard::new();

        fn faulty(guard: &RefreshGuard) -> Result<(), &'static str> {
            let _token = guard.try_acquire().ok_or("busy")?;
            Err("中途失败")
        }

        assert_eq!(faulty(&guard), Err("中途失败"));
        // 出错路径也必须释放
        assert!(!guard.is_held());
    }
}
