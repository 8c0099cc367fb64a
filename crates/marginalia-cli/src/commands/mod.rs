//! CLI command implementations

pub mod dates;
pub mod health;
pub mod init;
pub mod network;
pub mod story;
pub mod validate;
