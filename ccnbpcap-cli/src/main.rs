use anyhow::{bail, Result};
use ccnbpcap_cli::commands;
use ccnbpcap_core::{DriverConfig, FrameConfig, PayloadMode};
use clap::{Parser, Subcommand};
use std::net::Ipv4Addr;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ccnbpcap")]
#[command(about = "ccnbpcap - Dump ccnb records as a pcap capture", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wrap every record in a UDP/IPv4 frame and write a pcap stream
    Dump {
        /// Input files, `-` for stdin
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Frame only the Content value of each ContentObject
        #[arg(long)]
        content_only: bool,

        /// Source IPv4 address
        #[arg(long)]
        src_addr: Option<Ipv4Addr>,

        /// Destination IPv4 address
        #[arg(long)]
        dst_addr: Option<Ipv4Addr>,

        /// Source UDP port
        #[arg(long)]
        src_port: Option<u16>,

        /// Destination UDP port
        #[arg(long)]
        dst_port: Option<u16>,

        /// Stop at the first input that fails
        #[arg(long)]
        fail_fast: bool,
    },

    /// List the records of an input
    Scan {
        /// Input file to scan, `-` for stdin
        #[arg(short, long)]
        input: String,

        /// Output JSON file for the record list
        #[arg(short, long)]
        output: Option<String>,

        /// Show statistics only
        #[arg(long)]
        stats_only: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout may carry capture bytes
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Dump {
            inputs,
            output,
            content_only,
            src_addr,
            dst_addr,
            src_port,
            dst_port,
            fail_fast,
        } => {
            let config = DriverConfig {
                mode: if content_only {
                    PayloadMode::ContentOnly
                } else {
                    PayloadMode::WholeRecord
                },
                frame: FrameConfig {
                    src_addr: src_addr.map(|a| a.octets()),
                    dst_addr: dst_addr.map(|a| a.octets()),
                    src_port,
                    dst_port,
                },
            };

            let summary = commands::dump::execute(&inputs, output.as_deref(), &config, fail_fast)?;
            if !summary.is_success() {
                bail!("{} of {} inputs failed", summary.failed, summary.inputs);
            }
            Ok(())
        }

        Commands::Scan {
            input,
            output,
            stats_only,
        } => {
            let stats = commands::scan::execute(&input, output.as_deref(), stats_only)?;
            if let Some(e) = stats.error {
                bail!("Scan of {} stopped early: {}", input, e);
            }
            Ok(())
        }
    }
}
