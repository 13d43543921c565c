//! CLI subcommand implementations.

pub mod ask;
pub mod chat;
pub mod modes;
