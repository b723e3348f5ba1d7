use std::env;

use crate::navigation::DEFAULT_MAX_REDIRECTS;

/// AppConfig
///
/// Navigation configuration, loaded once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and the fail-fast rules below.
    pub env: Env,
    // Base URL of the backend API the permission set is fetched from.
    pub api_base_url: String,
    // Path of the permission endpoint, relative to `api_base_url`.
    pub permissions_path: String,
    pub progress_show_spinner: bool,
    // Upper bound on chained guard redirects before a navigation is abandoned.
    pub max_redirects: usize,
    // Address the manifest service listens on.
    pub bind_addr: String,
}

/// Env
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Local values that need no environment variables, for tests.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_base_url: "http://localhost:3000".to_string(),
            permissions_path: "/user/permissions".to_string(),
            progress_show_spinner: false,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            bind_addr: "0.0.0.0:4000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `API_BASE_URL` is not set, and in any environment
    /// when a numeric or boolean variable does not parse.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let defaults = Self::default();

        let api_base_url = match env {
            Env::Production => {
                env::var("API_BASE_URL").expect("FATAL: API_BASE_URL must be set in production.")
            }
            Env::Local => env::var("API_BASE_URL").unwrap_or(defaults.api_base_url),
        };

        let progress_show_spinner = env::var("PROGRESS_SHOW_SPINNER")
            .map(|value| {
                value
                    .parse::<bool>()
                    .expect("FATAL: PROGRESS_SHOW_SPINNER must be 'true' or 'false'")
            })
            .unwrap_or(defaults.progress_show_spinner);

        let max_redirects = env::var("MAX_REDIRECTS")
            .map(|value| {
                value
                    .parse::<usize>()
                    .expect("FATAL: MAX_REDIRECTS must be a non-negative integer")
            })
            .unwrap_or(defaults.max_redirects);

        Self {
            env,
            api_base_url,
            permissions_path: env::var("PERMISSIONS_PATH").unwrap_or(defaults.permissions_path),
            progress_show_spinner,
            max_redirects,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }
}
