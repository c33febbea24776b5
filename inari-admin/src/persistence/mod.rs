mod session_locks;
mod session_store;

pub use session_locks::{SessionGuard, SessionLocks};
pub use session_store::{OpendalSessionStore, SessionStore, StoreError};
