mod app;
pub(crate) mod app_state;
mod extractors;
pub(crate) mod routes;
mod trace;

pub use app::{create_app, AdminServer, AdminServerBuildError};
pub(crate) use app_state::AppState;
