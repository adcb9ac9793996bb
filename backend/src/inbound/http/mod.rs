//! HTTP inbound adapter: pages, JSON APIs and the guards they rely on.

pub mod auth;
pub mod csrf;
pub mod error;
pub mod pages;
pub mod questions;
pub mod search;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod token;
pub mod users;
pub mod views;

pub use error::ApiResult;
