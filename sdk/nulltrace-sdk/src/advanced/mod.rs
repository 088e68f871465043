pub mod auth;
pub mod fee;
pub mod mint;
pub mod packer;
pub mod pipeline;
pub mod selection;
