pub mod dao;
pub mod gate;

pub use dao::{SchemaStore, DEFAULT_INVITE_PRICE};
pub use gate::{TransactionGate, UnitOfWork};
