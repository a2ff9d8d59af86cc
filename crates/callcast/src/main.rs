//! callcast server binary.

use anyhow::Context;
use callcast::config::{CallcastConfig, LayeredConfigOptions};
use callcast::{CallHub, init_logging};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

/// Command-line options for the server.
#[derive(Debug, Parser)]
#[command(name = "callcast", version, about)]
struct Cli {
    /// Extra callcast.json5 files applied after the discovered layers
    #[arg(long)]
    config: Vec<PathBuf>,
    /// Listen address (overrides config and HOST)
    #[arg(long)]
    host: Option<String>,
    /// Listen port (overrides config and PORT)
    #[arg(long)]
    port: Option<u16>,
    /// Skip the system and user config layers
    #[arg(long)]
    isolated: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<CallcastConfig> {
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let mut options = if cli.isolated {
        let mut options = LayeredConfigOptions::isolated(&cwd);
        options.read_env = true;
        options
    } else {
        LayeredConfigOptions::new(&cwd)
    };
    for path in &cli.config {
        options = options.with_runtime_path(path);
    }
    let layered = CallcastConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());

    let mut config = layered.config;
    if let Some(host) = cli.host.clone() {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate().context("invalid command-line overrides")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    info!(
        "starting callcast (config_files={}, host_set={}, port_set={})",
        cli.config.len(),
        cli.host.is_some(),
        cli.port.is_some()
    );
    let config = load_config(&cli)?;
    let hub = CallHub::new(config.hub.clone());

    let result = callcast::server::serve(hub.clone(), &config).await;
    hub.shutdown();
    result.context("server exited with an error")
}

#[cfg(test)]
mod tests {
    use super::{Cli, load_config};
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn runtime_config_and_flags_are_applied() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("callcast.json5");
        fs::write(
            &path,
            "{ hub: { transcript_capacity: 50, call_expiry_secs: 5 }, server: { port: 9100 } }",
        )
        .expect("write config");

        let cli = Cli::parse_from([
            "callcast",
            "--isolated",
            "--config",
            path.to_str().expect("utf8 path"),
            "--port",
            "9200",
        ]);
        let config = load_config(&cli).expect("config");
        assert_eq!(config.server.port, 9200);
        assert_eq!(config.hub.transcript_capacity, 50);
        assert_eq!(config.hub.call_expiry_secs, 5);
    }

    #[test]
    fn missing_runtime_config_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("absent.json5");
        let cli = Cli::parse_from([
            "callcast",
            "--isolated",
            "--config",
            missing.to_str().expect("utf8 path"),
        ]);
        assert!(load_config(&cli).is_err());
    }
}
