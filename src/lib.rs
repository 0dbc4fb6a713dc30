/// Lune - a private keepsake site for two
///
/// Love messages, a photo gallery, letters and a mood check-in that answers
/// with a verse, behind a login with progressive hints and a time lock.

pub mod access;
pub mod activity;
pub mod account;
pub mod api;
pub mod auth;
pub mod blob_store;
pub mod clock;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod jobs;
pub mod memories;
pub mod mood;
pub mod rate_limit;
pub mod server;
pub mod session;
