//! IndieAuth login and Micropub post composer for a personal website.
//!
//! Log in with your own domain, stage photos, a location and a publish date
//! across requests, then publish the post to your site's Micropub endpoint.
//!
//! Start a server with [`AdminServer::from_data_dir_path`]. Configuration is
//! read from `config.toml` in the data directory, see [`ConfigToml`].

#![cfg_attr(any(), deny(clippy::unwrap_used))]

mod app_context;
mod archive;
mod client_server;
mod composer;
mod data_directory;
mod discovery;
mod geocoder;
mod indieauth;
mod persistence;
mod shared;
pub mod tracing;

pub use app_context::{AppContext, AppContextConversionError};
pub use client_server::{create_app, AdminServer, AdminServerBuildError};
pub use data_directory::*;
