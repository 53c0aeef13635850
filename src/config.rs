//! Runtime configuration
//!
//! Read once at process start and passed explicitly into the service.
//! Nothing in the library looks up the environment on its own after that.

use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-0528:free";
pub const DEFAULT_APP_TITLE: &str = "BudgetWise AI Financial App";
pub const DEFAULT_REFERER: &str = "http://localhost:5173";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Completion provider settings
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Sent as `HTTP-Referer` for provider-side attribution
    pub referer: String,
    /// Sent as `X-Title`
    pub app_title: String,
    pub request_timeout: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AdvisorConfig {
    /// Build from process environment.
    ///
    /// `OPENROUTER_API_KEY` is the only secret; a blank value counts as missing.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = non_blank_var("OPENROUTER_API_KEY");
        let model = non_blank_var("OPENROUTER_MODEL").unwrap_or(defaults.model);
        let referer = non_blank_var("ADVISOR_REFERER").unwrap_or(defaults.referer);
        let app_title = non_blank_var("ADVISOR_APP_TITLE").unwrap_or(defaults.app_title);
        let request_timeout = non_blank_var("ADVISOR_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Self {
            base_url: defaults.base_url,
            api_key,
            model,
            referer,
            app_title,
            request_timeout,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    pub fn with_app_title(mut self, app_title: impl Into<String>) -> Self {
        self.app_title = app_title.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Settings for the HTTP server binary
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .or_else(|_| env::var("API_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let database_url = non_blank_var("DATABASE_URL").or_else(|| non_blank_var("POSTGRES_URL"));

        Self { port, database_url }
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
