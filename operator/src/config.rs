use std::time::Duration;

use clap::Parser;

/// Process-wide configuration. All fields are sourced from flags with
/// environment variable fallback, mirroring how the metrics port is
/// configured: a flag that falls back to an env var of the same name.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Identifies this control plane instance. Used as the leading
    /// component of every external resource name (see naming::external_name).
    #[arg(long, env = "INSTANCE_NAME")]
    pub instance_name: String,

    /// Hostname suffix appended to a resource's custom hostname.
    #[arg(long, env = "DOMAIN")]
    pub domain: String,

    /// Address the REST API surface binds to.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Period between drift reconciliation ticks, e.g. "30s".
    #[arg(long, env = "TICK_INTERVAL", default_value = "30s", value_parser = parse_tick_interval)]
    pub tick_interval: Duration,

    /// Number of cooperative reconcile workers pulling from the queue.
    #[arg(long, env = "WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Prometheus metrics server scrape port. Disabled by default.
    #[cfg(feature = "metrics")]
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

fn parse_tick_interval(s: &str) -> Result<Duration, String> {
    parse_duration::parse(s).map_err(|e| e.to_string())
}
