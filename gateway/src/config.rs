use std::env;

/// Gateway runtime configuration.
#[derive(Debug, Clone)]
pub(crate) struct GatewayConfig {
    /// Base URL of the helpdesk backend API.
    pub backend_api_url: String,

    /// Port the gateway listens on.
    pub port: u16,

    /// Whether auth cookies carry the `Secure` attribute. Enabled in
    /// production so local http setups keep working.
    pub secure_cookies: bool,
}

impl GatewayConfig {
    /// Loads the configuration from environment variables, falling back
    /// to local-development defaults.
    pub fn from_env() -> Self {
        let backend_api_url = env::var("BACKEND_API_URL")
            .unwrap_or_else(|_| String::from("http://localhost:8080/api"));
        let port = env::var("PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(3000);
        let secure_cookies = env::var("APP_ENV").is_ok_and(|env| env == "production");

        Self {
            backend_api_url,
            port,
            secure_cookies,
        }
    }
}
