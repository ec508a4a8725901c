//! Persistent memory and keyword alerts for a news digest bot.
//!
//! The [`db::Repository`] owns all state: an append-only log of answered
//! `/news` requests and the per-chat alert keywords. [`alerts`] decides who
//! to notify for freshly fetched text, [`analytics`] derives history and
//! trending views from the log, and [`bot`] wires both to chat commands.

pub mod ai;
pub mod alerts;
pub mod analytics;
pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod health;
pub mod models;
pub mod news;
pub mod telegram;

pub use error::{AppError, Result};
