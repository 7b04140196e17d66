use clap::{Parser, Subcommand};
use photon_catalog::catalog::Catalog;
use photon_catalog::types::ProductPath;
use photon_catalog::{config, export, generate, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn version_string() -> &'static str {
    if env!("ON_RELEASE_TAG") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("GIT_HASH") {
        "" => "dev@unknown",
        // Leaked once at startup
        hash => Box::leak(format!("dev@{hash}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "photon-catalog")]
#[command(about = "Product catalog resolver for a static laser equipment site")]
#[command(long_about = "\
Product catalog resolver for a static laser equipment site

Products are descriptor files grouped by category directory. The products
root is discovered by walking up from --root.

Products layout:

  src/data/products/
  ├── Seed-Lasers/                     # Category \"seed-lasers\"
  │   ├── 1.5um-seed.ts                # Product \"1-5um-seed\"
  │   ├── 1.5um-seed.json              # Title sidecar (optional)
  │   └── narrow-linewidth-seed/       # Directory product
  │       ├── meta.json                # Title sidecar (optional)
  │       └── index.ts                 # Descriptor
  └── Fiber-Amplifiers/
      └── edfa.json                    # JSON descriptor

Descriptor lookup (first existing file wins, per slug variant):
  <slug>/product.json  <slug>/meta.json  <slug>/index.json  <slug>.json
  <slug>/index.ts  <slug>/index.tsx  <slug>/index.js
  <slug>.ts  <slug>.tsx  <slug>.js
  then any .ts/.tsx/.js inside the <slug>/ directory.

Run 'photon-catalog gen-config' to generate a documented catalog.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project directory (where catalog.toml lives and discovery starts)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Production mode: suppress debug diagnostics
    #[arg(long, global = true)]
    production: bool,

    /// Log at debug level for every crate, even in production
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enumerate categories and products
    Scan,
    /// Print the static {category, product} route list as JSON
    Paths,
    /// Resolve one product and print its canonical record
    Product {
        /// Category slug or directory name
        category: String,
        /// Product slug
        slug: String,
    },
    /// Write <public_dir>/data/products.json
    Export,
    /// Print the products index as the site serves it
    Index,
    /// Export, then resolve every route and write its payload
    Build,
    /// Resolve every route without writing; fails if any is missing
    Check,
    /// Print a stock catalog.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let mut catalog_config = config::load_config(&cli.root)?;
    catalog_config.production |= cli.production;
    init_logging(catalog_config.production, cli.verbose);
    init_thread_pool(&catalog_config.processing);

    let public_dir = cli.root.join(&catalog_config.output.public_dir);
    let dist_dir = cli.root.join(&catalog_config.output.dist_dir);
    let catalog = Catalog::discover(&cli.root, catalog_config);

    match cli.command {
        Command::Scan => {
            output::print_catalog_output(catalog.categories(), catalog.root());
        }
        Command::Paths => {
            println!("{}", serde_json::to_string_pretty(catalog.paths())?);
        }
        Command::Product { category, slug } => {
            let resolution = catalog.product(&category, &slug);
            let path = ProductPath::new(category, slug);
            output::print_resolution(&path, &resolution, catalog.root());
            match &resolution.product {
                Some(product) => println!("{}", serde_json::to_string_pretty(product)?),
                None => return Ok(ExitCode::FAILURE),
            }
        }
        Command::Export => {
            export_index(&catalog, &public_dir)?;
        }
        Command::Index => {
            let index = export::load_products_index(&public_dir.join(export::INDEX_PATH));
            println!("{}", serde_json::to_string_pretty(&index)?);
        }
        Command::Build => {
            println!("==> Exporting products index");
            export_index(&catalog, &public_dir)?;

            println!("==> Generating routes → {}", dist_dir.display());
            let report = generate::generate(&catalog, &dist_dir)?;
            output::print_build_report(&report, catalog.root(), Some(dist_dir.as_path()));

            println!("==> Build complete: {}", dist_dir.display());
        }
        Command::Check => {
            match catalog.root() {
                Some(root) => println!("==> Checking {}", root.display()),
                None => println!("==> Checking (no products directory found)"),
            }
            let report = generate::check(&catalog);
            output::print_build_report(&report, catalog.root(), None);
            if !report.is_complete() {
                return Ok(ExitCode::FAILURE);
            }
            println!("==> All products resolve");
        }
        // Printed before config loading
        Command::GenConfig => {}
    }

    Ok(ExitCode::SUCCESS)
}

fn export_index(catalog: &Catalog, public_dir: &Path) -> Result<(), export::ExportError> {
    let index = export::build_index(catalog.root(), catalog.config());
    let path = export::write_products_index(public_dir, &index)?;
    output::print_export_output(&path, &index);
    Ok(())
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set. Otherwise this crate logs at debug level in
/// development and info level in production; `--verbose` opens debug for
/// every crate.
fn init_logging(production: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else if production {
            EnvFilter::new("photon_catalog=info")
        } else {
            EnvFilter::new("photon_catalog=debug")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    info!(production, "photon-catalog starting");
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never exceeds the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
