// src/main.rs
mod config;
mod extractors;
mod server;
mod service;
mod storage;
mod utils;

use clap::{Parser, Subcommand};
use config::ServerConfig;
use extractors::pdf::PdfText;
use extractors::report::Record;
use service::ReportService;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use utils::AppError;

/// Extracts haemoglobin, iron and vitamin results from PDF lab reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Debug logging for labscan and the HTTP layers (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service accepting `POST /upload`
    Serve {
        /// Address to listen on
        #[arg(long, env = "LABSCAN_BIND", default_value = config::DEFAULT_BIND)]
        bind: SocketAddr,

        /// Largest accepted request body in bytes
        #[arg(long, env = "LABSCAN_MAX_UPLOAD_BYTES", default_value_t = config::DEFAULT_MAX_UPLOAD_BYTES)]
        max_upload_bytes: usize,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Extract lab results from a local PDF and print them as JSON
    Extract {
        /// Path to the PDF report
        path: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(clap::Args, Debug)]
struct PipelineArgs {
    /// Directory where uploads are staged while their text is extracted
    #[arg(long, env = "LABSCAN_UPLOAD_DIR", default_value = config::DEFAULT_UPLOAD_DIR)]
    upload_dir: PathBuf,

    /// Seconds allowed for reading the text out of one document
    #[arg(long, env = "LABSCAN_EXTRACT_TIMEOUT_SECS", default_value_t = config::DEFAULT_EXTRACT_TIMEOUT_SECS)]
    extract_timeout_secs: u64,

    /// Documents parsed at the same time; further uploads wait for a slot
    #[arg(long, env = "LABSCAN_MAX_CONCURRENT_PARSES", default_value_t = config::DEFAULT_MAX_CONCURRENT_PARSES)]
    max_concurrent_parses: usize,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.verbose);
    tracing::info!("Starting labscan with args: {:?}", args);

    // 3. Run the requested command
    match args.command {
        Command::Serve {
            bind,
            max_upload_bytes,
            pipeline,
        } => {
            let config = ServerConfig::new(
                bind,
                pipeline.upload_dir,
                max_upload_bytes,
                pipeline.extract_timeout_secs,
                pipeline.max_concurrent_parses,
            )?;
            server::serve(config).await?;
        }
        Command::Extract { path, pipeline } => {
            let defaults = ServerConfig::default();
            let config = ServerConfig::new(
                defaults.bind,
                pipeline.upload_dir,
                defaults.max_upload_bytes,
                pipeline.extract_timeout_secs,
                pipeline.max_concurrent_parses,
            )?;

            let records = extract_file(&config, &path).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }

    Ok(())
}

/// Runs a local file through the same validation and extraction as an upload.
async fn extract_file(config: &ServerConfig, path: &Path) -> Result<Vec<Record>, AppError> {
    let service = ReportService::new(config, Arc::new(PdfText::new()))?;

    let filename = service.validate(path.file_name().and_then(|n| n.to_str()))?;
    let bytes = tokio::fs::read(path).await?;
    tracing::info!("Processing {} ({} bytes)", path.display(), bytes.len());

    let records = service.process(filename, &bytes).await?;
    Ok(records)
}
