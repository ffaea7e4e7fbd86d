use anyhow::Context;
use clap::{Parser, Subcommand};
use hostrelay_domain::{CliOverrides, Config, DaemonConfig, UpstreamTarget};
use hostrelay_infrastructure::store::JsonHostStore;
use std::path::PathBuf;
use tracing::info;

mod bootstrap;
mod commands;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "hostrelay")]
#[command(version)]
#[command(about = "Local DNS responder for development hostnames, with upstream passthrough")]
struct Cli {
    /// Working directory for the pid file, log and host table
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Configuration file path (default: <DIR>/config.toml)
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// DNS server port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Upstream resolver, e.g. udp://1.1.1.1:53 (repeatable, replaces the configured list)
    #[arg(long, value_name = "URL")]
    upstream: Vec<UpstreamTarget>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the DNS daemon in the background
    Start,
    /// Stop the DNS daemon
    Stop,
    /// Stop, then start the DNS daemon
    Restart,
    /// Show whether the DNS daemon is running
    Status,
    /// Run the DNS server in the foreground (daemon entry point)
    #[command(hide = true)]
    Run {
        port: u16,
        working_dir: PathBuf,
    },
    /// Manage the host table
    Hosts {
        #[command(subcommand)]
        command: HostsCommand,
    },
}

#[derive(Subcommand)]
enum HostsCommand {
    /// Map a hostname to an address or to another hostname
    Set { key: String, value: String },
    /// Remove a hostname
    Rm { key: String },
    /// List all entries
    Ls,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (working_dir, port) = match &cli.command {
        Command::Run { port, working_dir } => (working_dir.clone(), Some(*port)),
        _ => (
            cli.dir.clone().unwrap_or_else(DaemonConfig::default_working_dir),
            cli.port,
        ),
    };
    // The daemon runs with its working directory as cwd.
    let working_dir = std::path::absolute(&working_dir)
        .with_context(|| format!("invalid working directory {}", working_dir.display()))?;
    let config_path = cli
        .config
        .as_deref()
        .map(std::path::absolute)
        .transpose()
        .context("invalid config path")?;

    let cli_overrides = CliOverrides {
        dns_port: port,
        bind_address: cli.bind.clone(),
        log_level: cli.log_level.clone(),
        upstream: cli.upstream.clone(),
    };

    let config = bootstrap::load_config(&working_dir, config_path.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    let forwarded = commands::daemon::forwarded_flags(
        config_path.as_deref(),
        cli.bind.as_deref(),
        cli.log_level.as_deref(),
        &cli.upstream,
    );

    match cli.command {
        Command::Start => {
            commands::daemon::start(&commands::daemon::supervisor(&config, forwarded)?, &config)
        }
        Command::Stop => commands::daemon::stop(&commands::daemon::supervisor(&config, forwarded)?),
        Command::Restart => {
            commands::daemon::restart(&commands::daemon::supervisor(&config, forwarded)?, &config)
        }
        Command::Status => {
            commands::daemon::status(&commands::daemon::supervisor(&config, forwarded)?)
        }
        Command::Run { .. } => run(&config),
        Command::Hosts { command } => hosts(&config, command),
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    info!("Starting hostrelay v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config))?;

    info!("Server shutdown complete");
    Ok(())
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let services = di::DnsServices::new(config).await?;
    server::start_dns_server(config, services.handler).await
}

fn hosts(config: &Config, command: HostsCommand) -> anyhow::Result<()> {
    let store = JsonHostStore::new(config.daemon.hosts_file());
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match command {
            HostsCommand::Set { key, value } => commands::hosts::set(&store, &key, &value).await,
            HostsCommand::Rm { key } => commands::hosts::remove(&store, &key).await,
            HostsCommand::Ls => commands::hosts::list(&store).await,
        }
    })
}
