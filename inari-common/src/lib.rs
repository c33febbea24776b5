//! Types shared across the Inari crates.
//!
//! The [session::UserSession] is the single unit of persistence: everything a
//! logged-in user has staged in the composer lives inside it by value.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(any(), deny(clippy::unwrap_used))]

pub mod composer;
pub mod hcard;
pub mod location;
pub mod session;

pub use composer::{ComposerData, MediaUpload};
pub use hcard::HCard;
pub use location::Location;
pub use session::{SessionId, SessionIdError, UserSession};
