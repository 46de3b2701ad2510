use std::env;

const DEFAULT_MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub upload_folder: String,
    pub max_content_length: usize,
    pub cors_origins: Vec<String>,
    /// Lets product writes through without an admin token. Development only.
    pub admin_open_access: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "super-secret-jwt".to_string());
        let upload_folder = env::var("UPLOAD_FOLDER").unwrap_or_else(|_| "uploads".to_string());
        let max_content_length = env::var("MAX_CONTENT_LENGTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_CONTENT_LENGTH);
        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
        );
        let admin_open_access = env::var("ADMIN_OPEN_ACCESS")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            upload_folder,
            max_content_length,
            cors_origins,
            admin_open_access,
        })
    }

    /// Configuration for tests and tooling that never reads the environment.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: "test-secret".to_string(),
            upload_folder: env::temp_dir()
                .join("storefront-uploads")
                .to_string_lossy()
                .into_owned(),
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            cors_origins: Vec::new(),
            admin_open_access: false,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
