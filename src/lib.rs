//! Report Bot Library
//!
//! A Telegram bot that lets users report users, groups and channels.
//!
//! This crate provides the core functionality for:
//! - Walking users through the `/report` conversation
//! - Enforcing a cooldown between reports of the same user
//! - Storing reports and recording admin reviews
//! - Notifying the report channel and the admins via `MTProto`

pub mod config;
pub mod conversation;
pub mod cooldown;
pub mod reports;
pub mod telegram;
