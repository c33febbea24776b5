pub mod archive;
pub mod auth;
pub mod composer;
pub mod root;
