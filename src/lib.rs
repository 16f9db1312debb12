//! Keyword Relay Bot Library
//!
//! A Telegram userbot that forwards keyword hits from its groups and
//! channels to a target channel, controlled through an official bot.
//!
//! This crate provides the core functionality for:
//! - Loading and validating configuration from the environment
//! - Persisting owner, admin and keyword state
//! - Matching and relaying messages with a delivery fallback
//! - Running admin commands through the userbot session

pub mod actions;
pub mod auth;
pub mod commands;
pub mod config;
pub mod relay;
pub mod telegram;
