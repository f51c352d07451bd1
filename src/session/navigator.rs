use tracing::warn;

/// Receives forced navigations, e.g. to the login route after a 401
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Terminal navigator: there is no screen to switch to, so tell the user to log in again
pub struct LoginPrompt;

impl Navigator for LoginPrompt {
    fn navigate(&self, route: &str) {
        warn!(route, "Session is no longer valid. Run `pantrypal login` to sign in again.");
    }
}
