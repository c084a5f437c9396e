//! CMTL Probe - internal probe routines as a command-line tool.
//!
//! Findings go to stdout so the launcher captures them; diagnostics go to
//! stderr through tracing.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cmtl_probe::{banner, ports, subdomain, sweep};
use std::time::Duration;

/// Internal probes of the CyberSec Multi Tool Launcher.
#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// TCP connect scan of a host
    PortScan {
        /// Target host (IP or domain)
        target: String,

        /// Port list (22,80,443) or range (1-1024); common ports when omitted
        ports: Option<String>,

        /// Connect timeout in seconds
        #[arg(long, default_value_t = 0.8)]
        timeout: f64,

        /// Connections in flight
        #[arg(long, default_value_t = 100)]
        workers: usize,
    },

    /// Ping every host of an IPv4 prefix
    PingSweep {
        /// Prefix without the last octet (192.168.1 or 192.168.1.)
        base: String,

        /// First host octet
        #[arg(default_value_t = 1)]
        start: u16,

        /// Last host octet
        #[arg(default_value_t = 20)]
        end: u16,

        /// Pings in flight
        #[arg(long, default_value_t = 50)]
        workers: usize,
    },

    /// Print the first response of a TCP service
    BannerGrab {
        /// Target hostname or IP
        host: String,

        /// Target port
        #[arg(default_value_t = 80)]
        port: u16,

        /// Connect and read timeout in seconds
        #[arg(long, default_value_t = 3)]
        timeout: u64,
    },

    /// Probe common subdomains over HTTP
    SubdomainFind {
        /// Target domain (example.com)
        domain: String,

        /// Extra subdomain prefixes to try
        #[arg(long, num_args = 1..)]
        extra: Vec<String>,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 2)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = run_command(cli.command).await {
        tracing::error!("Probe failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize tracing subscriber writing to stderr
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if verbose {
        EnvFilter::new("cmtl_probe=debug")
    } else {
        EnvFilter::new("cmtl_probe=warn")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::PortScan {
            target,
            ports: port_spec,
            timeout,
            workers,
        } => {
            let port_list = match port_spec {
                Some(spec) => ports::parse_ports(&spec)?,
                None => ports::COMMON_PORTS.to_vec(),
            };
            let timeout = Duration::try_from_secs_f64(timeout)
                .context("timeout must be a non-negative number of seconds")?;

            println!("Scanning {} ({} ports)...", target, port_list.len());
            let open = ports::scan(&target, &port_list, timeout, workers).await?;
            for port in &open {
                println!("[+] {}:{} OPEN", target, port);
            }
            if open.is_empty() {
                println!("No open ports found (on the scanned list).");
            } else {
                println!("Open ports: {:?}", open);
            }
        }
        Commands::PingSweep {
            base,
            start,
            end,
            workers,
        } => {
            let hosts = sweep::hosts(&base, start, end)?;
            println!(
                "Pinging {} hosts on {}.x ...",
                hosts.len(),
                base.trim_end_matches('.')
            );
            let alive = sweep::sweep(&hosts, workers).await?;
            for host in &alive {
                println!("[UP] {}", host);
            }
            println!("Alive hosts: {:?}", alive);
        }
        Commands::BannerGrab {
            host,
            port,
            timeout,
        } => {
            let banner = banner::grab(&host, port, Duration::from_secs(timeout)).await?;
            println!("Banner output:");
            println!("{}", banner);
        }
        Commands::SubdomainFind {
            domain,
            extra,
            timeout,
        } => {
            let client = subdomain::client(Duration::from_secs(timeout))
                .context("Failed to create HTTP client")?;
            let urls = subdomain::candidates(&domain, &extra);
            let findings = subdomain::probe(&client, &urls).await;
            for finding in &findings {
                println!("[FOUND] {} -> {}", finding.url, finding.status);
            }
            println!("Done. Found {} of {} candidates.", findings.len(), urls.len());
        }
    }

    Ok(())
}
