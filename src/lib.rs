//! Append-only, hash-linked diary sealed with proof-of-work.

pub mod api;
pub mod blockchain;
pub mod config;
