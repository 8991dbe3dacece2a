// listone entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout stays free for --stdout)
// 2. Load config (copying defaults/ into config/ on first run)
// 3. Apply command-line overrides
// 4. Read, normalize and aggregate every declared source
// 5. Write the consolidated database (or print it)

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use listone_core::config;
use listone_core::pipeline;
use listone_core::reader::CsvReader;
use tracing::info;

#[derive(Parser)]
#[command(name = "listone")]
#[command(about = "Consolidate fantasy football price lists into one player database")]
#[command(version)]
struct Cli {
    /// Directory holding config/ and defaults/ (defaults to the current directory)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Directory holding the source CSV exports, overriding the config
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Output file, overriding the config
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the database to stdout instead of writing the output file
    #[arg(long)]
    stdout: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize tracing
    init_tracing()?;

    // 2. Load config
    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    let mut config =
        config::load_config_in(&base_dir).context("failed to load configuration")?;

    // 3. Apply overrides
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    info!(
        "Config loaded: {} seasons, data in {}",
        config.registry.seasons().len(),
        config.data_dir.display()
    );

    // 4./5. Build and write
    let reader = CsvReader::new(config.delimiter);
    let summary = if cli.stdout {
        let summary = pipeline::build_database(&config, &reader)
            .context("failed to build player database")?;
        let json = summary
            .database
            .to_json_string()
            .context("failed to serialize player database")?;
        std::io::stdout()
            .lock()
            .write_all(json.as_bytes())
            .context("failed to write to stdout")?;
        summary
    } else {
        pipeline::run(&config, &reader).context("failed to build player database")?
    };

    for bucket in summary.database.buckets() {
        info!("role {}: {} players", bucket.role, bucket.players.len());
    }
    info!(
        "Done: {} files, {} rows, {} players",
        summary.sources.len(),
        summary.rows,
        summary.database.len()
    );
    Ok(())
}

/// Initialize tracing to log to stderr.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("listone=info,listone_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
