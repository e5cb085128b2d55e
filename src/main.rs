use clap::{Parser, Subcommand};
use photofolio::assets::AssetIndex;
use photofolio::generate::{GenerateOptions, generate};
use photofolio::imaging::RustBackend;
use photofolio::query::{self, GetImagesOptions, Order, SortKey};
use photofolio::{config, output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "photofolio")]
#[command(about = "Metadata generator for photo portfolios")]
#[command(long_about = "\
Metadata generator for photo portfolios

Your filesystem is the data source. Directories become collections, file
names become captions, and camera data is read from EXIF. The result is a
single gallery.yaml you can edit by hand; re-running generate keeps your
edits and refreshes everything else.

Gallery structure:

  gallery/
  ├── config.toml                  # Optional settings (see gen-config)
  ├── gallery.yaml                 # The store, written by generate
  ├── landscape.jpg                # Image without a collection
  ├── kuku/                        # Collection \"kuku\" (name: \"Kuku\")
  │   ├── kuku-trees.jpg           # Title: \"Kuku Trees\"
  │   └── kuku-bubble.jpg
  └── backup/                      # Kept out of the store with --backup-prefix backup
      └── ...

Run 'photofolio gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a gallery, optimize images and update its store
    Generate(GenerateArgs),
    /// List images from a store, joined to their assets
    Images(ImagesArgs),
    /// List the collections of a store
    Collections(CollectionsArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Gallery root directory
    dir: PathBuf,

    /// Longer-edge limit for optimized images, in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_dimension: Option<u32>,

    /// JPEG quality for optimized images (1-100)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Only read metadata, never modify image files
    #[arg(long)]
    skip_optimization: bool,

    /// Relative directory to keep out of the store (e.g. "backup")
    #[arg(long)]
    backup_prefix: Option<String>,

    /// Check every image again instead of trusting the optimization cache
    #[arg(long)]
    no_cache: bool,
}

#[derive(clap::Args)]
struct ImagesArgs {
    /// Store file
    #[arg(long, default_value = query::DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// Directory holding the image assets
    #[arg(long, default_value = "src")]
    assets: PathBuf,

    /// Only images in this collection
    #[arg(long)]
    collection: Option<String>,

    /// Sort before ordering
    #[arg(long, value_enum)]
    sort_by: Option<SortKey>,

    #[arg(long, value_enum, default_value_t = Order::Asc)]
    order: Order,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct CollectionsArgs {
    /// Store file
    #[arg(long, default_value = query::DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Generate(args) => {
            let mut site_config = config::load_config(&args.dir)?;
            if let Some(max) = args.max_dimension {
                site_config.images.max_dimension = max;
            }
            if let Some(quality) = args.quality {
                site_config.images.quality = quality;
            }
            if args.skip_optimization {
                site_config.images.optimize = false;
            }
            if let Some(prefix) = args.backup_prefix {
                site_config.backup.prefix = Some(prefix);
            }
            site_config.validate()?;
            init_thread_pool(&site_config.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let options = GenerateOptions {
                use_cache: !args.no_cache,
                progress: Some(tx),
            };
            // The sender is dropped with `options` when generate returns,
            // which ends the printer loop.
            let result = generate(&RustBackend::new(), &args.dir, &site_config, options);
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let report = result?;
            println!();
            output::print_generate_output(&report);
        }
        Command::Images(args) => {
            // Asset keys are built from both paths, so they must share a form.
            let store_path = std::path::absolute(&args.store)?;
            let assets_dir = std::path::absolute(&args.assets)?;
            let assets = AssetIndex::build(&RustBackend::new(), &assets_dir);
            let options = GetImagesOptions {
                store_path,
                collection: args.collection,
                sort_by: args.sort_by,
                order: args.order,
            };
            let images = query::get_images(&options, &assets)?;
            if args.json {
                output::print_json(&images)?;
            } else {
                output::print_images(&images);
            }
        }
        Command::Collections(args) => {
            let collections = query::get_collections(&args.store)?;
            if args.json {
                output::print_json(&collections)?;
            } else {
                output::print_collections(&collections);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "photofolio=debug"
    } else {
        "photofolio=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
