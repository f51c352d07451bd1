pub mod api;
pub mod app;
pub mod cli;
pub mod constants;
pub mod runtime;
pub mod session;
pub mod utils;

pub use api::ApiGateway;
pub use app::{load_config, AppState, Config};
pub use session::{AuthState, SessionStore, User};
pub use utils::{ApiError, SessionError};
