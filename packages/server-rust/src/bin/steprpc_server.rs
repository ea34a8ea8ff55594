//! Standalone Step RPC server on the local node.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::EnvFilter;

use steprpc_server::local::{local_operations, LocalContextResolver, StaticInterpretedSource};
use steprpc_server::network::DEFAULT_BASE_PATH;
use steprpc_server::{NetworkConfig, NetworkModule, StepRpc, StepRpcConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "steprpc-server", version, about = "Step RPC server")]
struct Cli {
    #[arg(long, env = "STEPRPC_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "STEPRPC_PORT", default_value_t = 8080)]
    port: u16,

    #[arg(long, env = "STEPRPC_BASE_PATH", default_value = DEFAULT_BASE_PATH)]
    base_path: String,

    /// Operation allowed to be invoked; repeat or comma-separate. None allows all.
    #[arg(long = "allow", env = "STEPRPC_ALLOW", value_delimiter = ',')]
    allow: Vec<String>,

    /// Step executed by a bridge poller, as `name` or `name=Display Name`.
    #[arg(long = "bridge-op", env = "STEPRPC_BRIDGE_OPS", value_delimiter = ',')]
    bridge_ops: Vec<String>,

    /// Node name treated as local besides `built-in` and `master`.
    #[arg(long, env = "STEPRPC_NODE_NAME", default_value = "built-in")]
    node_name: String,

    #[arg(long, env = "STEPRPC_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    cors_origins: Vec<String>,

    #[arg(long, env = "STEPRPC_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    #[arg(long, value_enum, env = "STEPRPC_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Serve Prometheus metrics on this port.
    #[arg(long, env = "STEPRPC_METRICS_PORT")]
    metrics_port: Option<u16>,
}

impl Cli {
    fn rpc_config(&self) -> StepRpcConfig {
        StepRpcConfig {
            allowlist: self
                .allow
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            ..StepRpcConfig::default()
        }
    }

    fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            base_path: self.base_path.clone(),
            ..NetworkConfig::default()
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,steprpc::audit=info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    if let Some(port) = cli.metrics_port {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()?;
        info!(port, "prometheus exporter listening");
    }

    let rpc_config = cli.rpc_config();
    info!(
        allowlist = ?rpc_config.allowlist,
        bridge_ops = cli.bridge_ops.len(),
        "starting steprpc-server"
    );

    let rpc = StepRpc::new(
        &rpc_config,
        Arc::new(local_operations()),
        Arc::new(StaticInterpretedSource::from_specs(&cli.bridge_ops)),
        Arc::new(LocalContextResolver::new(cli.node_name.clone())),
    );

    let mut module = NetworkModule::new(cli.network_config(), rpc);
    let port = module.start().await?;
    info!(port, base_path = %cli.base_path, "ready");
    module.serve(shutdown_signal()).await?;

    info!("shutdown complete");
    Ok(())
}
