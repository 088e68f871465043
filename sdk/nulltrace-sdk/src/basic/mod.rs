pub mod balances;
pub mod client;
pub mod nullify;
pub mod reveal;
pub mod swap;
pub mod transfer;
