use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use ringbus::example;
use ringbus::memory::{has_robust_mutex, shm_object_path, Channel, ChannelOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ringbus")]
#[command(about = "Shared memory ring buffer channels and components")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the example counter component until its limit or Ctrl+C
    Run {
        /// Component config (TOML, YAML or JSON); defaults to the first `counter.*` found
        #[arg(short = 'c', long = "config-path", value_name = "FILE")]
        config_path: Option<PathBuf>,

        /// Tick frequency in Hz, overriding the config
        #[arg(short = 'f', long = "frequency", value_name = "HZ")]
        frequency: Option<f64>,
    },

    /// Show the header of an existing channel
    Inspect {
        /// Channel name, e.g. /ringbus_counter
        topic: String,

        /// Bytes per message on this channel
        #[arg(short = 'l', long = "message-length")]
        message_length: usize,

        /// Also dump retained messages, oldest first
        #[arg(short = 'm', long = "messages")]
        messages: bool,

        /// Print the header as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a channel left behind by a publisher that exited uncleanly
    Remove {
        /// Channel name
        topic: String,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run_command(cli.command) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

// RUST_LOG controls verbosity; library `log` records are forwarded as well
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            config_path,
            frequency,
        } => run_counter(config_path, frequency),
        Commands::Inspect {
            topic,
            message_length,
            messages,
            json,
        } => inspect_channel(&topic, message_length, messages, json),
        Commands::Remove { topic } => {
            ringbus::remove_channel(&topic)
                .with_context(|| format!("failed to remove channel '{}'", topic))?;
            println!("{} {}", "Removed".green().bold(), topic);
            Ok(())
        }
    }
}

fn run_counter(config_path: Option<PathBuf>, frequency: Option<f64>) -> Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => ringbus::find_config_file("counter")
            .context("no counter.{toml,yaml,yml,json} found; pass --config-path")?,
    };

    let mut component = example::build_counter(&path, |value| {
        println!("  {} {}", "received".cyan(), value);
    })
    .with_context(|| format!("failed to set up counter from {}", path.display()))?;

    let frequency = frequency.unwrap_or(component.config().frequency_hz);
    let topic = component.config().publisher.topic.clone();

    let stop = component.stop_handle();
    ctrlc::set_handler(move || {
        eprintln!("{}", "\nCtrl+C received! Stopping counter...".red());
        stop.stop();
    })
    .context("failed to install Ctrl+C handler")?;

    println!(
        "{} counter on '{}' at {:.1} Hz",
        "Running".green().bold(),
        topic,
        frequency
    );
    component.run(frequency)?;
    component.join()?;

    let metrics = component.metrics();
    println!(
        "{} after {} ticks ({} overruns, {} publish errors)",
        "Stopped".yellow().bold(),
        metrics.ticks,
        metrics.overruns,
        metrics.publish_errors
    );
    Ok(())
}

fn inspect_channel(topic: &str, message_length: usize, messages: bool, json: bool) -> Result<()> {
    let channel = Channel::attach(topic, message_length, &ChannelOptions::default())
        .with_context(|| format!("failed to attach to channel '{}'", topic))?;
    let stats = channel.stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{} {}", "Channel".bold(), stats.topic.cyan());
        println!("  capacity:       {}", stats.capacity);
        println!("  message length: {}", stats.message_length);
        println!("  size:           {}", stats.size);
        println!("  start / end:    {} / {}", stats.start, stats.end);
        println!("  readers:        {}", stats.reader_count);
        println!("  lock:           {}", if channel.lock_is_held() { "held" } else { "free" });
        println!(
            "  owner recovery: {}",
            if has_robust_mutex() { "robust" } else { "timeout only" }
        );
        if let Some(path) = shm_object_path(topic) {
            println!("  backing object: {}", path.display());
        }
    }

    if messages {
        for (i, message) in channel.retained_messages()?.iter().enumerate() {
            let hex: Vec<String> = message.iter().map(|b| format!("{:02x}", b)).collect();
            println!("  [{}] {}", i, hex.join(" "));
        }
    }
    Ok(())
}
