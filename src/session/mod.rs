pub mod reaper;
pub mod store;

pub use reaper::SessionReaper;
pub use store::{Session, SessionHandle, SessionStore};
