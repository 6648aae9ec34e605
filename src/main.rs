use chrono::Utc;
use clap::{Parser, Subcommand};
use folio::catalog::{self, CATALOG_FILE};
use folio::probe::FsProbe;
use folio::types::CatalogSnapshot;
use folio::{config, layout, output};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Artwork catalog builder for portfolio sites")]
#[command(long_about = "\
Artwork catalog builder for portfolio sites

An inventory spreadsheet exported as CSV becomes a catalog document of
collections and artworks. Image files are probed for their dimensions to
lay out each collection as a row of uniform height.

Catalog structure:

  catalog/
  ├── config.toml                  # Catalog config (optional)
  ├── artworks.csv                 # Inventory, one row per artwork
  │                                #   Title, ID, Collection, Pricing, Dimensions,
  │                                #   Size, Featured, Notes, Extended description
  ├── collections.csv              # Optional: Title, ID, Description, Notes
  └── images/
      ├── black-swan.jpg           # Named after the artwork id
      └── ML-2.jpg

Field resolution (first available wins):
  Id:          ID column → slug of the title (\"Black Swan\" → black-swan)
  Collection:  collection id → collection name → new collection
  Price:       first $ amount in Pricing → Pricing verbatim
  Image:       Image column → images.pattern with {id}

Run 'folio gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Catalog directory
    #[arg(long, default_value = "catalog", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Log build details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the catalog and write catalog.json to the output directory
    Build,
    /// Validate the catalog directory without writing anything
    Check,
    /// Probe images of a built catalog and print the collection rows
    Layout,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build => {
            println!("==> Reading {}", cli.source.display());
            let build = catalog::build_source(&cli.source, Utc::now())?;
            output::print_build_output(&build.snapshot, &build.warnings);

            let catalog_path = cli.output.join(CATALOG_FILE);
            build.snapshot.save(&catalog_path)?;
            println!("==> Build complete: {}", catalog_path.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let build = catalog::build_source(&cli.source, Utc::now())?;
            output::print_build_output(&build.snapshot, &build.warnings);
            if build.warnings.is_empty() {
                println!("==> Catalog is valid");
            } else {
                println!("==> Catalog is usable, with {} warnings", build.warnings.len());
            }
        }
        Command::Layout => {
            let config = config::load_config(&cli.source)?;
            let catalog_path = cli.output.join(CATALOG_FILE);
            let snapshot = CatalogSnapshot::load(&catalog_path);
            if snapshot.is_empty() {
                println!(
                    "==> No catalog at {}; run 'folio build' first",
                    catalog_path.display()
                );
                return Ok(());
            }

            let images = image_root(&cli.source, &config.images.directory);
            println!("==> Probing images in {}", images.display());
            let probe = FsProbe::new(images);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let rows = runtime.block_on(layout::layout_catalog(&probe, &snapshot, &config.layout));
            output::print_layout_output(&snapshot, &rows);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Route `tracing` events to stderr so stdout stays the report.
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Image directory, relative to the catalog directory unless absolute.
fn image_root(source: &Path, directory: &str) -> PathBuf {
    source.join(directory)
}
