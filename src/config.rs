#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum CargoEnv {
    Development,
    Production,
}

/// where the relay finds the upstream url on an inbound request
#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum TargetMode {
    /// `GET /proxy?url=<percent encoded url>`
    Query,
    /// `GET /<absolute url>`, everything after the first slash is the target
    Path,
}

/// how content headers from the origin are treated
#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum ContentTypePolicy {
    /// copy whatever the origin sends, only cors is overridden
    Passthrough,
    /// drop Content-Disposition and always answer with video/mp2t
    Forced,
}

pub const DEFAULT_USER_AGENT: &str = "VLC/3.0.20 LibVLC/3.0.20";

#[derive(clap::Parser, Debug, Clone)]
#[command(name = "relay", about = "Stateless streaming relay for IPTV origins")]
pub struct AppConfig {
    // production or development
    #[clap(long, env, value_enum, default_value = "development")]
    pub cargo_env: CargoEnv,

    // port that the app will bind to
    #[clap(long, env, default_value = "5000")]
    pub port: u16,

    #[clap(long, env, default_value = "0.0.0.0")]
    pub bind_address: String,

    // one convention per deployment, never both
    #[clap(long, env, value_enum, default_value = "query")]
    pub target_mode: TargetMode,

    // use forced only behind origins that mislabel segments or send attachment dispositions
    #[clap(long, env, value_enum, default_value = "passthrough")]
    pub content_type_policy: ContentTypePolicy,

    // DANGER: turns off certificate verification toward every origin. Only for providers with
    // broken chains, anything on the path can then read and alter the relayed stream.
    #[clap(long, env, default_value_t = false)]
    pub insecure_upstream_tls: bool,

    // how long to wait for the origin's response headers, 0 waits forever. the body itself is
    // never timed out since live playlists and segments can trickle in slowly
    #[clap(long, env, default_value = "30")]
    pub upstream_timeout_secs: u64,

    #[clap(long, env, default_value = "10")]
    pub connect_timeout_secs: u64,

    // outbound proxy for origin requests, ambient HTTP_PROXY variables are ignored
    #[clap(long, env)]
    pub upstream_proxy: Option<String>,

    // path suffixes that mark a target as a segment, range is never forwarded for these
    #[clap(long, env, value_delimiter = ',', default_value = ".ts")]
    pub segment_suffixes: Vec<String>,

    // forward the client's own headers and stream its body upstream
    #[clap(long, env, default_value_t = false)]
    pub forward_request_headers: bool,

    // a lot of iptv origins refuse browser agents, a player agent gets through almost everywhere
    #[clap(long, env, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    // prometheus text on /metrics
    #[clap(long, env, default_value_t = false)]
    pub metrics: bool,

    // optional sentry integration
    #[clap(long, env)]
    pub sentry_dsn: Option<String>,
}

impl AppConfig {
    /// `None` when the header wait is unbounded
    pub fn upstream_timeout(&self) -> Option<std::time::Duration> {
        match self.upstream_timeout_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}

impl Default for AppConfig {
    // mirrors the clap defaults, used by the invocation handler and tests
    fn default() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            port: 5000,
            bind_address: "0.0.0.0".to_string(),
            target_mode: TargetMode::Query,
            content_type_policy: ContentTypePolicy::Passthrough,
            insecure_upstream_tls: false,
            upstream_timeout_secs: 30,
            connect_timeout_secs: 10,
            upstream_proxy: None,
            segment_suffixes: vec![".ts".to_string()],
            forward_request_headers: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            metrics: false,
            sentry_dsn: None,
        }
    }
}
