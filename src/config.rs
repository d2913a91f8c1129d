pub const DEFAULT_USER_AGENT: &str = concat!("playlist-proxy/", env!("CARGO_PKG_VERSION"));

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum CargoEnv {
    Development,
    Production,
}

impl CargoEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            CargoEnv::Development => "development",
            CargoEnv::Production => "production",
        }
    }
}

#[derive(clap::Parser, Clone, Debug)]
pub struct AppConfig {
    // production or development
    #[clap(long, env, value_enum, default_value = "development")]
    pub cargo_env: CargoEnv,

    // port that the app will bind to
    #[clap(long, env, default_value = "5000")]
    pub port: u16,

    // redis url for playlist storage. leave it out and everything lives in memory, which is fine
    // for trying things locally but is gone on restart
    #[clap(long, env)]
    pub redis_url: Option<String>,

    // this should be either * for allowing everything, or a comma seperated list of domains like
    // https://example.com,https://something.com
    // only the /api routes use this, /proxy is always open
    #[clap(long, env, default_value = "*")]
    pub cors_origin: String,

    // origin written into rewritten manifests (https://my.app). when unset it's worked out from the
    // forwarded headers of each request, set it if the app sits behind something that strips them
    #[clap(long, env)]
    pub public_origin: Option<String>,

    // user agent for outbound requests when the player didn't send one
    #[clap(long, env, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    // optional sentry integration
    #[clap(long, env)]
    pub sentry_dsn: Option<String>,
}

impl AppConfig {
    /// allowed origins for the api routes, `None` means anything goes
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        let trimmed = self.cors_origin.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return None;
        }

        Some(
            trimmed
                .split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        )
    }
}

impl Default for AppConfig {
    // mostly used by tests, the real values come from clap
    fn default() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            port: 5000,
            redis_url: None,
            cors_origin: "*".to_string(),
            public_origin: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            sentry_dsn: None,
        }
    }
}
