use std::sync::Arc;

use crate::{
    archive::Archive, composer::Composer, geocoder::Geocoder, indieauth::IndieAuthClient,
    persistence::SessionStore, AppContext, IndieAuthToml,
};

#[derive(Debug, Clone)]
pub(crate) struct AppState {
    pub(crate) indieauth: IndieAuthClient,
    pub(crate) composer: Composer,
    pub(crate) archive: Archive,
    pub(crate) geocoder: Arc<dyn Geocoder>,
    pub(crate) session_store: Arc<dyn SessionStore>,
    /// This application's `client_id` and `redirect_uri`.
    pub(crate) client: IndieAuthToml,
}

impl AppState {
    pub fn new(context: &AppContext) -> Self {
        Self {
            indieauth: context.indieauth(),
            composer: context.composer(),
            archive: context.archive(),
            geocoder: context.geocoder.clone(),
            session_store: context.session_store.clone(),
            client: context.config_toml.indieauth.clone(),
        }
    }
}
