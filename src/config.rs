use std::env;

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct AppConfig {
    pub admin_token: String,
    pub member_tokens: Vec<String>,
    pub host: String,
    pub port: u16,
    pub uploads_dir: String,
    pub max_upload_size: u64,
    pub temp_max_age_secs: u64,
    pub temp_sweep_interval_secs: u64,
    pub log_level: String,
    pub cors_allowed_origins: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            admin_token: env::var("ADMIN_TOKEN").expect("ADMIN_TOKEN must be set"),
            member_tokens: env::var("MEMBER_TOKENS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".into()),
            max_upload_size: parse_env("MAX_UPLOAD_SIZE", 2_147_483_648),
            temp_max_age_secs: parse_env("TEMP_MAX_AGE_SECS", 86_400),
            temp_sweep_interval_secs: parse_env("TEMP_SWEEP_INTERVAL_SECS", 3_600),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".into()),
        }
    }

    pub fn uploads_root(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.uploads_dir)
    }

    pub fn temp_uploads_dir(&self) -> std::path::PathBuf {
        self.uploads_root().join("tmp")
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
