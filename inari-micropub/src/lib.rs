//! Micropub client used by the Inari admin server.
//!
//! Posts are created with a form-urlencoded request, media goes to the media
//! endpoint as multipart, and the archive is paged through `q=source` queries.
//! The [`MicropubClient`] trait is the seam the server depends on, so tests can
//! substitute a fake.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(any(), deny(clippy::unwrap_used))]

mod client;
pub mod errors;
pub mod types;

pub use client::{HttpMicropubClient, HttpMicropubClientBuilder, MicropubClient, MEDIA_PAGE_SIZE};
pub use errors::{BuildError, Error, RequestError, Result};
pub use types::{
    ArchiveMonth, ArchiveYear, ListPaging, MediaEndpointResponse, MediaFile, MediaItem, MediaList,
    MediaQuery, MicroFormat, MicropubConfig, MicropubResponse, PostList,
};
