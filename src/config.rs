use std::env;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Http,
    Memory,
}

impl StoreBackend {
    pub fn parse(s: &str) -> Self {
        match s {
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::Http,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub reservation_api_url: String,
    pub store_backend: StoreBackend,
    pub memory_seed_path: Option<String>,
    pub request_timeout_secs: u64,
    pub session_idle_secs: u64,
    pub frontend_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            reservation_api_url: env::var("RESERVATION_API_URL")
                .unwrap_or_else(|_| "http://localhost:5000/api".to_string()),
            store_backend: StoreBackend::parse(
                &env::var("STORE_BACKEND").unwrap_or_default(),
            ),
            memory_seed_path: env::var("MEMORY_SEED_PATH").ok().filter(|v| !v.is_empty()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            session_idle_secs: env::var("SESSION_IDLE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1800),
            frontend_origin: env::var("FRONTEND_ORIGIN").ok().filter(|v| !v.is_empty()),
        }
    }
}
