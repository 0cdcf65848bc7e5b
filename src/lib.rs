pub mod invite;

// 重新导出常用类型和函数，方便外部使用
pub use invite::{
    client::{ClientConfig, InviteClient},
    error::{InviteError, Result},
    types::{InviteRecord, RefreshOutcome, RefreshRule, WithdrawalRecord, WithdrawalStatus},
};
