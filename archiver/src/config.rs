use envconfig::Envconfig;
use tracing::Level;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "TARGET_BUCKET")]
    pub target_bucket: String,

    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "PORT", default = "8080")]
    pub port: u16,

    #[envconfig(default = "false")]
    pub print_sink: bool,

    #[envconfig(default = "false")]
    pub export_prometheus: bool,

    // 20MB, base64-encoded Pub/Sub messages top out around 13.4MB
    #[envconfig(default = "20971520")]
    pub max_body_size: usize,

    pub otel_url: Option<String>,

    #[envconfig(default = "1.0")]
    pub otel_sampling_rate: f64,

    #[envconfig(default = "log-archiver")]
    pub otel_service_name: String,

    #[envconfig(default = "info")]
    pub otel_log_level: Level,
}

impl Config {
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
