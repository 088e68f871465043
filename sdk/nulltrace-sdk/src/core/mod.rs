pub mod config;
pub mod connection;
pub mod constants;
pub mod operator;
pub mod program;
pub mod rpc;
pub mod signer;
