use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use recitation_mirror::cache::{CatalogCache, HttpCatalogFetcher};
use recitation_mirror::config::{ConfigFile, ConfigLoader, MirrorConfig};
use recitation_mirror::domain::TransferBackend;
use recitation_mirror::error::MirrorError;
use recitation_mirror::layout::Layout;
use recitation_mirror::mirror::{Mirror, MirrorSummary, RunOptions};
use recitation_mirror::output::JsonOutput;
use recitation_mirror::transfer::{Aria2cTransfer, StreamingTransfer};

#[derive(Parser)]
#[command(name = "recmirror")]
#[command(about = "Mirrors a remote recitation catalog into a local directory tree")]
#[command(version, author)]
struct Cli {
    /// Print machine-readable JSON instead of the plain-text summary.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Mirror all catalog media into the destination tree (default)")]
    Mirror(MirrorArgs),
    #[command(about = "Print the normalized catalog as JSON")]
    Catalog(CatalogArgs),
}

#[derive(Args, Default)]
struct MirrorArgs {
    #[arg(long)]
    config: Option<String>,

    /// Restrict each recording set to the canonical sample units.
    #[arg(long)]
    test: bool,

    /// Transfer backend to use.
    #[arg(long)]
    backend: Option<TransferBackend>,

    /// Only mirror the variant whose group key matches the set id.
    #[arg(long)]
    match_group: bool,

    #[arg(long)]
    root: Option<String>,

    #[arg(long)]
    catalog_url: Option<String>,

    #[arg(long)]
    cache_file: Option<String>,
}

#[derive(Args)]
struct CatalogArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    catalog_url: Option<String>,

    #[arg(long)]
    cache_file: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(mirror) = report.downcast_ref::<MirrorError>() {
            return ExitCode::from(map_exit_code(mirror));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &MirrorError) -> u8 {
    match error {
        MirrorError::CatalogUnavailable(_) | MirrorError::InvalidCatalogFormat(_) => 2,
        MirrorError::MissingTool(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Mirror(args)) => run_mirror(args, cli.json),
        Some(Commands::Catalog(args)) => run_catalog(args),
        None => run_mirror(MirrorArgs::default(), cli.json),
    }
}

fn resolve_config(path: Option<&str>) -> miette::Result<MirrorConfig> {
    let file = ConfigLoader::resolve(path).into_diagnostic()?;
    MirrorConfig::from_file(file).into_diagnostic()
}

fn run_mirror(args: MirrorArgs, json: bool) -> miette::Result<()> {
    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(url) = args.catalog_url {
        config.catalog_url = url;
    }
    if let Some(path) = args.cache_file {
        config.cache_file = path.into();
    }
    if let Some(root) = args.root {
        config.root = root.into();
    }
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    config.test_mode |= args.test;
    config.match_group_only |= args.match_group;

    let fetcher = HttpCatalogFetcher::new(&config.catalog_url).into_diagnostic()?;
    let cache = CatalogCache::new(config.cache_file.clone());
    let sets = cache.load(&fetcher).into_diagnostic()?;

    let layout = Layout::new_with_root(config.root.clone());
    let options = RunOptions {
        test_mode: config.test_mode,
        match_group_only: config.match_group_only,
        throttle: config.throttle,
    };

    let summary = match config.backend {
        TransferBackend::Streaming => {
            let transfer = StreamingTransfer::new().into_diagnostic()?;
            Mirror::new(layout, transfer, options)
                .run(&sets)
                .into_diagnostic()?
        }
        TransferBackend::Aria2c => {
            let transfer = Aria2cTransfer::new();
            transfer.probe().into_diagnostic()?;
            Mirror::new(layout, transfer, options)
                .run(&sets)
                .into_diagnostic()?
        }
    };

    if json {
        JsonOutput::print_summary(&summary).into_diagnostic()?;
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn run_catalog(args: CatalogArgs) -> miette::Result<()> {
    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(url) = args.catalog_url {
        config.catalog_url = url;
    }
    if let Some(path) = args.cache_file {
        config.cache_file = path.into();
    }

    let fetcher = HttpCatalogFetcher::new(&config.catalog_url).into_diagnostic()?;
    let cache = CatalogCache::new(config.cache_file);
    let sets = cache.load(&fetcher).into_diagnostic()?;
    JsonOutput::print_catalog(&sets).into_diagnostic()?;
    Ok(())
}

fn print_summary(summary: &MirrorSummary) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    println!("{cyan}recmirror summary{reset}");
    println!("{green}  downloaded: {}{reset}", summary.downloaded);
    println!("{yellow}  skipped:    {}{reset}", summary.skipped);
    println!("{red}  failed:     {}{reset}", summary.failed);

    for unit in &summary.units {
        if let Some(error) = &unit.error {
            println!(
                "{red}  set {} unit {}: {error}{reset}",
                unit.set_id, unit.unit
            );
        }
    }
}
