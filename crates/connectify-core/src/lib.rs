//! Core Connectify library (backend client, session, feed, follows, media).

pub mod backend;
pub mod config;
pub mod error;
pub mod feed;
pub mod follows;
pub mod logging;
pub mod media;
pub mod models;
pub mod oauth;
pub mod ports;
pub mod services;
pub mod session;

pub use error::{ClientError, ClientResult, ErrorCategory};
pub use services::Services;
