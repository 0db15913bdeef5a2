use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub node_env: String,
    pub client_url: String,
    pub cors_origins: Vec<String>,
    pub db: DbConfig,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub pool_min: u32,
    pub pool_max: u32,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_secs: i64,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let email_user = env::var("EMAIL_USER").ok().filter(|s| !s.is_empty());
        Self {
            port: env_or_parse("PORT", 5000),
            node_env: env_or("NODE_ENV", "development"),
            client_url: env_or("CLIENT_URL", "http://localhost:3000"),
            cors_origins: env_or("CORS_ORIGINS", "http://localhost:3000")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            db: DbConfig {
                host: env_or("DB_HOST", "localhost"),
                port: env_or_parse("DB_PORT", 5432),
                database: env_or("DB_NAME", "sanctuary_connect"),
                user: env_or("DB_USER", "sanctuary_admin"),
                password: env_or("DB_PASSWORD", ""),
                pool_min: env_or_parse("DB_POOL_MIN", 5),
                pool_max: env_or_parse("DB_POOL_MAX", 20),
            },
            jwt: JwtConfig {
                secret: env_or("JWT_SECRET", "change-me-to-a-secure-random-string"),
                expiry_secs: parse_duration_to_secs(&env_or("JWT_EXPIRATION", "1h")),
            },
            email: EmailConfig {
                smtp_host: env_or("EMAIL_HOST", "smtp.gmail.com"),
                smtp_port: env_or_parse("EMAIL_PORT", 587),
                from: env_or(
                    "EMAIL_FROM",
                    email_user.as_deref().unwrap_or("no-reply@localhost"),
                ),
                user: email_user,
                password: env::var("EMAIL_PASSWORD").ok().filter(|s| !s.is_empty()),
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.node_env == "production"
    }

    pub fn database_url(&self) -> String {
        if let Ok(url) = env::var("DATABASE_URL") {
            return url;
        }
        if let Ok(url) = env::var("POSTGRES_URL") {
            return url;
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db.user, self.db.password, self.db.host, self.db.port, self.db.database
        )
    }
}

fn parse_duration_to_secs(s: &str) -> i64 {
    let s = s.trim();
    let scaled = |rest: &str, unit_secs: i64| rest.parse::<i64>().ok().map(|n| n * unit_secs);
    s.strip_suffix('s')
        .and_then(|rest| scaled(rest, 1))
        .or_else(|| s.strip_suffix('m').and_then(|rest| scaled(rest, 60)))
        .or_else(|| s.strip_suffix('h').and_then(|rest| scaled(rest, 3600)))
        .or_else(|| s.strip_suffix('d').and_then(|rest| scaled(rest, 86400)))
        .or_else(|| s.parse().ok())
        .unwrap_or(3600)
}

#[cfg(test)]
mod tests {
    use super::parse_duration_to_secs;

    #[test]
    fn parses_suffixed_durations() {
        assert_eq!(parse_duration_to_secs("1h"), 3600);
        assert_eq!(parse_duration_to_secs("30d"), 30 * 86400);
        assert_eq!(parse_duration_to_secs("45s"), 45);
        assert_eq!(parse_duration_to_secs("10m"), 600);
    }

    #[test]
    fn falls_back_on_garbage() {
        assert_eq!(parse_duration_to_secs(""), 3600);
        assert_eq!(parse_duration_to_secs("soon"), 3600);
        // Multibyte trailing characters must not panic.
        assert_eq!(parse_duration_to_secs("1é"), 3600);
        assert_eq!(parse_duration_to_secs("é"), 3600);
    }

    #[test]
    fn bare_seconds_are_accepted() {
        assert_eq!(parse_duration_to_secs("7200"), 7200);
    }

    #[test]
    fn production_flag_follows_node_env() {
        let mut config = super::Config::from_env();
        config.node_env = "production".to_string();
        assert!(config.is_production());
        config.node_env = "development".to_string();
        assert!(!config.is_production());
    }
}
