pub mod engine;
pub mod guard;
pub mod nickname;

pub use engine::{pick_rule, RefreshEngine};
pub use guard::{GuardToken, RefreshGuard};
pub use nickname::NicknameStrategy;
