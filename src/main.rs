use clap::{Parser, Subcommand};
use folio::config::{self, SiteConfig};
use folio::manifest::{self, ROUTES_FILE, SNAPSHOT_FILE};
use folio::resolve::{self, RouteSet};
use folio::types::Snapshot;
use folio::{generate, output, source};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Static portfolio site generator fed by headless-CMS content")]
#[command(long_about = "\
Static portfolio site generator fed by headless-CMS content

Works, categories, tags, history, skills and certifications are fetched from
a JSON export or a GraphQL endpoint, resolved into pages, and written out as
plain HTML.

Pages:

  /                          Featured (pick-up) works
  /about                     Profile, skills, history, certifications
  /works                     All works, tags by popularity, categories
  /works/detail/<slug>       One page per work
  /works/category/<slug>     Works in a category, pick-up first
  /works/tag/<slug>          Works with a tag, pick-up first

Content export layout (source.kind = \"files\"):

  content/
  ├── works.json
  ├── categories.json
  ├── tags.json
  ├── histories.json
  ├── skills.json
  ├── certifications.json        # optional
  └── profile.json               # optional

Set RUST_LOG (e.g. RUST_LOG=folio=debug) for diagnostics on stderr.
Run 'folio gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site configuration file. Relative content and asset paths resolve
    /// against its directory.
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (snapshot, routes)
    #[arg(long, default_value = ".folio-temp", global = true)]
    temp_dir: PathBuf,

    /// Log pipeline diagnostics at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read every collection from the content source into a snapshot
    Fetch,
    /// Validate the snapshot and resolve it into routes
    Resolve,
    /// Produce the final HTML site from resolved routes
    Generate,
    /// Run the full pipeline: fetch → resolve → generate
    Build,
    /// Fetch, validate and resolve without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site_config = config::load_config(&cli.config)?;
    let root = config_root(&cli.config);
    let snapshot_path = cli.temp_dir.join(SNAPSHOT_FILE);
    let routes_path = cli.temp_dir.join(ROUTES_FILE);

    match cli.command {
        Command::Fetch => {
            let snapshot = fetch(&site_config, root)?;
            manifest::write_json(&snapshot_path, &snapshot)?;
            output::print_fetch_output(&snapshot);
        }
        Command::Resolve => {
            let snapshot: Snapshot = manifest::read_json(&snapshot_path)?;
            let routes = resolve::resolve(&snapshot)?;
            manifest::write_json(&routes_path, &routes)?;
            output::print_resolve_output(&routes);
        }
        Command::Generate => {
            run_generate(&cli, &site_config, root, &routes_path)?;
        }
        Command::Build => {
            println!("==> Stage 1: Fetching content");
            let snapshot = fetch(&site_config, root)?;
            manifest::write_json(&snapshot_path, &snapshot)?;
            output::print_fetch_output(&snapshot);

            println!("==> Stage 2: Resolving routes");
            let routes = resolve::resolve(&snapshot)?;
            manifest::write_json(&routes_path, &routes)?;
            output::print_resolve_output(&routes);

            println!("==> Stage 3: Generating HTML → {}", cli.output.display());
            run_generate(&cli, &site_config, root, &routes_path)?;

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking content");
            let snapshot = fetch(&site_config, root)?;
            let routes: RouteSet = resolve::resolve(&snapshot)?;
            output::print_resolve_output(&routes);
            println!("==> Content is valid");
        }
        // Printed before the config is loaded.
        Command::GenConfig => {}
    }

    Ok(())
}

fn fetch(site_config: &SiteConfig, root: &Path) -> Result<Snapshot, Box<dyn Error>> {
    init_thread_pool(&site_config.source);
    let content = source::from_config(&site_config.source, root)?;
    Ok(source::fetch_snapshot(content.as_ref())?)
}

fn run_generate(
    cli: &Cli,
    site_config: &SiteConfig,
    root: &Path,
    routes_path: &Path,
) -> Result<(), Box<dyn Error>> {
    let assets_dir = root.join(&site_config.site.assets_dir);
    let report = generate::generate(routes_path, &site_config.site, &assets_dir, &cli.output)?;
    output::print_generate_output(&report, &cli.output);
    Ok(())
}

/// Directory of the config file; relative paths in it resolve from here.
fn config_root(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

/// Diagnostics to stderr. `RUST_LOG` wins; otherwise warnings only, or
/// debug with `--verbose`.
fn init_tracing(verbose: bool) -> Result<(), Box<dyn Error>> {
    let default = if verbose { "folio=debug" } else { "folio=warn" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

/// Initialize the rayon thread pool based on source config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(source: &config::SourceConfig) {
    let threads = config::effective_threads(source);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
