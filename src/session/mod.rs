/// Session management module - Gateway

mod navigator;
mod state;
mod storage;
mod store;

pub use navigator::{LoginPrompt, Navigator};
pub use state::{AuthState, Session, SessionContext, User};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, Slot};
pub use store::SessionStore;

#[cfg(test)]
pub use navigator::MockNavigator;
#[cfg(test)]
pub use storage::MockSessionStorage;
