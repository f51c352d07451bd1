/// Constants module to avoid magic numbers in the codebase

// Application identity
pub const APP_NAME: &str = "pantrypal";
pub const ENV_PREFIX: &str = "PANTRYPAL_";
pub const LOCAL_CONFIG_PATH: &str = ".pantrypal/config.toml";

// Network Configuration
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 120; // recipe generation waits on the AI service

// Session
pub const LOGIN_ROUTE: &str = "/login";
pub const TOKEN_SLOT: &str = "token";
pub const USER_SLOT: &str = "user";

// Headers
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const JSON_CONTENT_TYPE: &str = "application/json";

// Messages surfaced to the user
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required";
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed";
pub const NETWORK_UNREACHABLE_MESSAGE: &str =
    "Unable to reach the server. Check that the backend is running and the base URL is correct.";

// Preferences
pub const DEFAULT_LANGUAGE: &str = "en";
