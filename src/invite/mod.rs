pub mod admin;
pub mod cache;
pub mod client;
pub mod db;
pub mod error;
pub mod gesture;
pub mod listener;
pub mod refresh;
pub mod store;
pub mod types;

// 重新导出常用类型，方便外部使用
pub use admin::AdminSettings;
pub use cache::InviteCache;
pub use client::{ClientConfig, InviteClient};
pub use error::{InviteError, Result};
pub use gesture::{GestureConfig, GestureController, GestureState};
pub use listener::{EmptyRefreshListener, RefreshListener};
pub use refresh::RefreshEngine;
pub use store::SchemaStore;
pub use types::{InviteRecord, RefreshOutcome, RefreshRule, WithdrawalRecord, WithdrawalStatus};
