//! GymCRM terminal console: a keyboard-driven admin client for the gym and
//! personal-training backend.

pub mod api;
pub mod app;
pub mod auth;
pub mod commands;
pub mod config;
pub mod event;
pub mod filter;
pub mod forms;
pub mod imaging;
pub mod query;
pub mod resources;
pub mod storage;
pub mod toast;
pub mod ui;
