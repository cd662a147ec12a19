//! lzham-bridge CLI entry point.
//!
//! Compresses and decompresses whole files with whichever backend this
//! binary was built with.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lzham_bridge::{CodecResult, SandboxConfig};
use lzham_bridge_common::{ConfigFile, LoggingConfig};

#[derive(Debug, Parser)]
#[command(name = "lzham-bridge", version, about = "LZHAM buffer codec")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "LZHAM_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compress INPUT into OUTPUT.
    Compress {
        input: PathBuf,
        output: PathBuf,

        /// Destination buffer size in bytes. Defaults to the input size plus
        /// one eighth plus 1 KiB.
        #[arg(long)]
        capacity: Option<usize>,
    },

    /// Decompress INPUT into OUTPUT.
    Decompress {
        input: PathBuf,
        output: PathBuf,

        /// Exact size of the decompressed data in bytes.
        #[arg(long)]
        size: usize,
    },

    /// Compile the guest module ahead of time and write a .cwasm artifact.
    Precompile { output: PathBuf },

    /// Show the selected backend and effective configuration.
    Info,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigFile::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ConfigFile::default(),
    };

    init_tracing(&config.logging);

    if lzham_bridge::configure(config.sandbox.clone()).is_err() {
        bail!("Sandbox was initialized before the configuration could be applied");
    }

    match cli.command {
        Command::Compress {
            input,
            output,
            capacity,
        } => {
            let source = read_input(&input)?;
            let capacity = capacity.unwrap_or_else(|| default_capacity(source.len()));
            let mut destination = vec![0u8; capacity];

            let result = lzham_bridge::compress(&mut destination, &source)
                .with_context(|| format!("Failed to compress {}", input.display()))?;
            write_output(&output, &destination[..result.written])?;
            report("Compressed", source.len(), &result);
        }
        Command::Decompress {
            input,
            output,
            size,
        } => {
            let source = read_input(&input)?;
            let mut destination = vec![0u8; size];

            let result = lzham_bridge::decompress(&mut destination, &source)
                .with_context(|| format!("Failed to decompress {}", input.display()))?;
            write_output(&output, &destination[..result.written])?;
            report("Decompressed", source.len(), &result);
        }
        Command::Precompile { output } => precompile(&output)?,
        Command::Info => print_info(&config.sandbox),
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let (json, text) = if logging.json {
        (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

/// Room for incompressible input plus stream overhead.
fn default_capacity(source_len: usize) -> usize {
    source_len + source_len / 8 + 1024
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn report(action: &str, source_len: usize, result: &CodecResult) {
    info!(
        source_len,
        written = result.written,
        adler32 = result.adler32,
        crc32 = result.crc32,
        "{action}"
    );
    println!(
        "{action} {source_len} -> {} bytes (adler32 {:08x}, crc32 {:08x})",
        result.written, result.adler32, result.crc32
    );
}

#[cfg(feature = "sandbox")]
fn precompile(output: &Path) -> anyhow::Result<()> {
    let codec = lzham_bridge_sandbox::SandboxCodec::global()
        .context("Failed to compile the guest module")?;
    let bytes = codec.module().serialize()?;
    write_output(output, &bytes)?;

    info!(
        path = %output.display(),
        size = bytes.len(),
        content_hash = %codec.module().content_hash(),
        "Wrote precompiled module"
    );
    Ok(())
}

#[cfg(not(feature = "sandbox"))]
fn precompile(_output: &Path) -> anyhow::Result<()> {
    bail!("precompile requires a build with the `sandbox` feature")
}

fn print_info(sandbox: &SandboxConfig) {
    match lzham_bridge::BACKEND {
        Some(kind) => println!("backend:        {kind}"),
        None => println!("backend:        none"),
    }
    println!("sandboxed:      {}", lzham_bridge::is_sandboxed());

    if lzham_bridge::is_sandboxed() {
        println!("max_memory_mb:  {}", sandbox.max_memory_mb);
        println!("opt_level:      {:?}", sandbox.opt_level);
        match &sandbox.module_path {
            Some(path) => println!("module:         {}", path.display()),
            None => println!("module:         embedded"),
        }
        if let Err(e) = lzham_bridge::prepare() {
            println!("status:         {e}");
        } else {
            println!("status:         ready");
        }
    }
}
