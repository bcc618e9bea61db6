//! Command-line front end for streamzip.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use streamzip::io::spool::{self, Spool, Spooled};
use streamzip::{
    ArchiveSource, Cli, ExtractionContext, ExtractionObserver, LocalArchive, ZipEntry, ZipParser,
};

/// Prints one line per entry as it starts.
struct Progress;

impl ExtractionObserver for Progress {
    fn entry_started(&self, entry: &ZipEntry) {
        println!("  extracting: {}", entry.name);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut ctx = ExtractionContext::new();
    if !cli.quiet {
        ctx = ctx.with_observer(Arc::new(Progress));
    }

    if cli.list_backends {
        for name in ctx.available_backends() {
            println!("{name}");
        }
        return Ok(());
    }

    if cli.list {
        let source = open_for_listing(&cli).await?;
        return list_entries(source, cli.verbose > 0).await;
    }

    let options = cli.options()?;
    if cli.is_http_url() {
        let response = reqwest::get(&cli.archive)
            .await
            .with_context(|| format!("failed to fetch {}", cli.archive))?
            .error_for_status()?;
        ctx.extract_stream(response.bytes_stream(), &options, &cli.spool())
            .await?;
    } else {
        ctx.extract(&cli.archive, &options)
            .await
            .with_context(|| format!("failed to extract {}", cli.archive))?;
    }

    if let Some(backend) = ctx.last_backend() {
        tracing::debug!(%backend, "extraction finished");
    }
    Ok(())
}

/// Listing needs random access, so a remote archive is spooled to memory first.
async fn open_for_listing(cli: &Cli) -> Result<Arc<dyn ArchiveSource>> {
    if !cli.is_http_url() {
        let archive = LocalArchive::open(Path::new(&cli.archive))
            .with_context(|| format!("cannot open {}", cli.archive))?;
        return Ok(Arc::new(archive));
    }

    let response = reqwest::get(&cli.archive).await?.error_for_status()?;
    let spooled = spool::spool(response.bytes_stream(), &Spool::Memory).await?;
    let Spooled::Memory(archive) = spooled else {
        anyhow::bail!("memory spool returned a file");
    };
    Ok(Arc::new(archive))
}

async fn list_entries(source: Arc<dyn ArchiveSource>, verbose: bool) -> Result<()> {
    let entries = ZipParser::new(source).list_entries().await?;

    if !verbose {
        for entry in &entries {
            println!("{}", entry.name);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  {:<7}  Name",
        "Length", "Size", "Cmpr", "Date", "Time", "Method"
    );
    println!("{}", "-".repeat(79));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _) = entry.mod_time();
        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {:<7}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.compression_method.to_string(),
            entry.name
        );
        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(79));
    println!(
        "{:>10}  {:>10}  {}  {:>30}  {} files",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        file_count
    );
    Ok(())
}

/// Space saved, as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed == 0 || compressed >= uncompressed {
        return "  0%".to_string();
    }
    format!("{:>3}%", 100 - compressed * 100 / uncompressed)
}
