//! Staging of a post across requests.
//!
//! Photos, a location and a publish date accumulate in the session's
//! [`ComposerData`] until [`Composer::submit_post`] sends them to the Micropub
//! endpoint. Each operation holds the session's lock from load to persist.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use inari_common::{ComposerData, HCard, Location, MediaUpload, SessionId};
use inari_micropub::{MediaFile, MicropubClient, MicropubResponse};
use reqwest::StatusCode;
use serde::Serialize;

use crate::persistence::{SessionLocks, SessionStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ComposerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Micropub(#[from] inari_micropub::Error),
    /// The Micropub endpoint did not accept the post. Staged data is kept.
    #[error("micropub endpoint responded with {status}")]
    SubmitRejected { status: StatusCode },
    #[error("session is not logged in")]
    NotAuthenticated,
}

/// What the composer page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposerView {
    pub me: String,
    pub hcard: HCard,
    pub composer: ComposerData,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct Composer {
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    micropub: Arc<dyn MicropubClient>,
}

impl Composer {
    pub fn new(
        store: Arc<dyn SessionStore>,
        locks: SessionLocks,
        micropub: Arc<dyn MicropubClient>,
    ) -> Self {
        Self {
            store,
            locks,
            micropub,
        }
    }

    pub async fn show(&self, id: &SessionId) -> Result<ComposerView, ComposerError> {
        let session = self.store.fetch_by_id(id).await?;
        Ok(ComposerView {
            location: session.composer_data.location.to_human(),
            me: session.me,
            hcard: session.hcard,
            composer: session.composer_data,
        })
    }

    /// Upload `files` to the media endpoint, staging each one that succeeds.
    ///
    /// A failed upload is logged and skipped. Returns the number staged.
    pub async fn add_photos(
        &self,
        id: &SessionId,
        files: Vec<MediaFile>,
    ) -> Result<usize, ComposerError> {
        let _guard = self.locks.lock(id).await;
        let mut session = self.store.fetch_by_id(id).await?;

        let mut staged = 0;
        for file in files {
            let file_name = file.file_name.clone();
            match self.micropub.upload_to_media_server(file, &session).await {
                Ok(response) => {
                    tracing::info!(session_id = %id, url = %response.url, "Uploaded photo");
                    session.composer_data.add_photo(MediaUpload::from(response));
                    self.store.create(&session).await?;
                    staged += 1;
                }
                Err(error) => {
                    tracing::warn!(?error, session_id = %id, %file_name, "Failed to upload photo");
                }
            }
        }

        Ok(staged)
    }

    /// Stage media that is already on the media endpoint.
    pub async fn add_media(&self, id: &SessionId, media: MediaUpload) -> Result<(), ComposerError> {
        let _guard = self.locks.lock(id).await;
        let mut session = self.store.fetch_by_id(id).await?;

        session.composer_data.add_photo(media);
        self.store.create(&session).await?;
        Ok(())
    }

    /// Replace the staged location.
    pub async fn add_location(&self, id: &SessionId, location: Location) -> Result<(), ComposerError> {
        let _guard = self.locks.lock(id).await;
        let mut session = self.store.fetch_by_id(id).await?;

        session.composer_data.set_location(location);
        self.store.create(&session).await?;
        Ok(())
    }

    /// Publish the staged post.
    ///
    /// Staged data is cleared only once the Micropub endpoint answers 2xx.
    pub async fn submit_post(
        &self,
        id: &SessionId,
        content: &str,
        h: &str,
    ) -> Result<MicropubResponse, ComposerError> {
        let _guard = self.locks.lock(id).await;
        let mut session = self.store.fetch_by_id(id).await?;
        if !session.is_authenticated() {
            return Err(ComposerError::NotAuthenticated);
        }

        let form = build_post_form(&session.composer_data, content, h, Utc::now());
        let response = self
            .micropub
            .send_request(&form, &session.micropub_endpoint, &session.access_token)
            .await?;

        if !response.is_success() {
            tracing::warn!(session_id = %id, status = %response.status, "Micropub endpoint rejected post");
            return Err(ComposerError::SubmitRejected {
                status: response.status,
            });
        }

        session.composer_data.clear();
        self.store.create(&session).await?;
        tracing::info!(session_id = %id, location = ?response.location, "Post created");

        Ok(response)
    }
}

/// Form fields of a create request, in the order they are sent.
pub fn build_post_form(
    composer: &ComposerData,
    content: &str,
    h: &str,
    now: DateTime<Utc>,
) -> Vec<(String, String)> {
    let mut form = vec![
        ("content".to_string(), content.to_string()),
        ("h".to_string(), h.to_string()),
    ];

    form.extend(
        composer
            .photo_urls()
            .map(|url| ("photo".to_string(), url.to_string())),
    );

    let published = if composer.published.is_empty() {
        now.to_rfc3339_opts(SecondsFormat::Secs, true)
    } else {
        composer.published.clone()
    };
    form.push(("published".to_string(), published));

    if composer.location.has_lat_lng() {
        form.push(("location".to_string(), composer.location.to_geo_url()));
    }

    form
}
