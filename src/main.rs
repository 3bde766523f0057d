use chart2kap::config::{self, Config, ProcessingConfig};
use chart2kap::converter::{Converter, DryRunConverter, ProcessConverter};
use chart2kap::logging::{self, Verbosity};
use chart2kap::resolve::BoundsResolver;
use chart2kap::strategy::{self, Capability};
use chart2kap::types::Tile;
use chart2kap::{output, run, scan};
use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Flags shared by every command that resolves tiles.
#[derive(clap::Args, Clone)]
struct ResolveArgs {
    /// Never use the georeferencing backend; read PNG + world file only
    #[arg(short = 'n', long)]
    no_delegated: bool,

    /// Take the world-file origin as the pixel corner, not the pixel center
    #[arg(long)]
    no_half_pixel_shift: bool,

    /// Chart tiles and/or directories to search recursively
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,
}

fn version_string() -> &'static str {
    let on_tag = env!("CHART2KAP_ON_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("CHART2KAP_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "chart2kap")]
#[command(about = "Convert georeferenced chart tiles to BSB/KAP charts")]
#[command(long_about = "\
Convert georeferenced chart tiles to BSB/KAP charts

For every tile the geographic bounding box is worked out and handed to the
chart converter (imgkap by default) as:

  imgkap <tile> <ullat> <ullon> <lrlat> <lrlon>

Georeferencing:

  delegated   GeoTIFF / PNG opened through the built-in georeferencing
              backend. Only tiles on the WGS 84 datum are accepted.
              Extensions: .png .tif .tiff
  direct      PNG header + .pgw world file, spherical Web Mercator.
              No datum check: tiles must already be WGS 84.
              Extensions: .png

Delegated is used when available; -n forces direct.

Run 'chart2kap gen-config' to generate a documented chart2kap.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log debug details
    #[arg(short, long, global = true)]
    debug: bool,

    /// Config file (default: ./chart2kap.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve every tile and run the chart converter on it
    Convert {
        #[command(flatten)]
        resolve: ResolveArgs,

        /// Log the converter commands instead of running them
        #[arg(long)]
        dry_run: bool,

        /// Maximum tiles processed in parallel (default: CPU cores)
        #[arg(short, long)]
        jobs: Option<NonZeroUsize>,
    },
    /// Resolve every tile and print the bounding boxes without converting
    Check {
        #[command(flatten)]
        resolve: ResolveArgs,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock chart2kap.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    if let Err(e) = logging::init(Verbosity::from_flags(cli.quiet, cli.debug)) {
        eprintln!("unable to set up logging: {e}");
    }
    let config = config::load_config(cli.config.as_deref(), Path::new("."))?;

    match cli.command {
        Command::Convert {
            resolve,
            dry_run,
            jobs,
        } => {
            init_thread_pool(&ProcessingConfig {
                max_processes: jobs.map(NonZeroUsize::get).or(config.processing.max_processes),
            });
            let resolver = select_resolver(&resolve, &config);
            let tiles = discover(&resolve, &config, resolver.as_ref())?;
            output::print_lines(&output::format_discovery(tiles.len(), resolver.strategy()));

            let program = config.converter.program.clone();
            let extra_args = config.converter.extra_args.clone();
            let converter: Box<dyn Converter> = if dry_run {
                Box::new(DryRunConverter::new(program, extra_args))
            } else {
                Box::new(ProcessConverter::new(program, extra_args))
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_run_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = run::run(&tiles, resolver.as_ref(), converter.as_ref(), Some(tx));
            printer.join().map_err(|_| "output thread panicked")?;
            let report = result?;

            println!();
            output::print_lines(&output::format_run_summary(&report));
        }
        Command::Check { resolve, json } => {
            init_thread_pool(&config.processing);
            let resolver = select_resolver(&resolve, &config);
            let tiles = discover(&resolve, &config, resolver.as_ref())?;

            let converter = DryRunConverter::new(
                config.converter.program.clone(),
                config.converter.extra_args.clone(),
            );
            let report = run::run(&tiles, resolver.as_ref(), &converter, None)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_lines(&output::format_discovery(tiles.len(), resolver.strategy()));
                println!();
                output::print_lines(&output::format_check_output(&report));
            }
        }
        Command::GenConfig => unreachable!("handled before logging setup"),
    }

    Ok(())
}

/// Pick the run's resolver from the compiled-in capability and the flags.
fn select_resolver(args: &ResolveArgs, config: &Config) -> Box<dyn BoundsResolver> {
    let mut direct = config.direct_options();
    if args.no_half_pixel_shift {
        direct.half_pixel_shift = false;
    }
    strategy::select(Capability::probe(), args.no_delegated, direct)
}

fn discover(
    args: &ResolveArgs,
    config: &Config,
    resolver: &dyn BoundsResolver,
) -> Result<Vec<Tile>, scan::ScanError> {
    scan::discover(&args.inputs, config.discovery.extensions(resolver.strategy()))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
