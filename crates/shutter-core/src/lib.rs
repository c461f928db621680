//! Core services of the shutter photo-feed client (auth, feed, profile).

pub mod auth;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod events;
pub mod feed;
pub mod profile;
pub mod session;
