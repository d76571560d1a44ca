//! jlv - Interactive viewer for line-delimited JSON log files.

use anyhow::{bail, Context, Result};
use clap::Parser;
use jlv::config::Config;
use jlv::file::{cache, File};
use jlv::view::FileView;
use std::path::PathBuf;
use std::sync::Arc;

/// An interactive terminal viewer for line-delimited JSON log files.
#[derive(Debug, Parser)]
#[command(
    name = "jlv",
    version,
    about,
    long_about = "jlv scrolls, filters and searches line-delimited JSON log files \
                  without loading them into memory, using a small vi-like command \
                  language typed directly into the terminal."
)]
struct Args {
    /// Path to the log file to view
    file: PathBuf,

    /// Field name carrying the record timestamp
    #[arg(long, value_name = "NAME")]
    time_tag: Option<String>,

    /// Field name carrying the record severity
    #[arg(long, value_name = "NAME")]
    level_tag: Option<String>,

    /// Field name carrying the record message
    #[arg(long, value_name = "NAME")]
    message_tag: Option<String>,

    /// Configuration file to use instead of the discovered one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging for development
    env_logger::init();

    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).context("loading configuration")?;
    let roles = config.merged_roles(args.time_tag, args.level_tag, args.message_tag);

    if !args.file.exists() {
        bail!("File does not exist: {}", args.file.display());
    }
    if !args.file.is_file() {
        bail!("Path is not a regular file: {}", args.file.display());
    }

    let source = std::fs::File::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;
    let file = File::open_with_cache(
        source,
        roles,
        config.cache_size.unwrap_or(cache::DEFAULT_CAPACITY),
    );
    if let Some(err) = file.last_error() {
        log::warn!("{}", err);
    }

    let shared = file.into_shared();
    let view = FileView::root(Arc::clone(&shared));

    if let Err(err) = jlv::ui::run(view).await {
        // Interactive startup failed or the input device closed; fall back
        // to a numbered dump of the raw lines.
        eprintln!("{}", err);
        let mut file = shared.lock();
        for n in 0..file.line_count() {
            println!("{:02}: {}", n, file.raw_text(n));
        }
    }

    Ok(())
}
