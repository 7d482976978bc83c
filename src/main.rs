use clap::{Parser, Subcommand, ValueEnum};
use gallery_source::catalog::Catalog;
use gallery_source::filter::{FilterState, FilterTransition, HistoryMode};
use gallery_source::gallery::{PagingHint, resolve_gallery};
use gallery_source::metadata::{DatabaseStore, FileStore, MetadataRecord, MetadataStore};
use gallery_source::source::Stores;
use gallery_source::source::folder::container_id;
use gallery_source::store::FsLister;
use gallery_source::{config, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gallery-source")]
#[command(about = "Resolve image galleries from folders, taxonomies and post queries")]
#[command(long_about = "\
Resolve image galleries from folders, taxonomies and post queries

A gallery is described by a config.toml: where its images come from, how
they are sorted and captioned, and which facet filters are offered.

Source kinds:

  folder        images in a directory, metadata from metadata.json or SQLite
  tag_set       attachments carrying any/all of the given media tags
  category_set  attachments in the given media categories (optionally nested)
  query         the first image of each post matched by a content query

Attachments, terms and posts are read from a JSON catalog (--catalog).

Configuration layers (later wins):
  stock defaults → config.toml → --set key=value

Run 'gallery-source gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content catalog (JSON) for taxonomy and query sources
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// SQLite database for the database metadata storage mode
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Log resolution details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Shared flags for commands that resolve a gallery.
#[derive(clap::Args, Clone)]
struct GalleryArgs {
    /// Gallery config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override a config value, e.g. --set sort=filename
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a gallery and list its items, facets and skipped entries
    Resolve {
        #[command(flatten)]
        gallery: GalleryArgs,

        /// Print the resolved gallery as JSON
        #[arg(long)]
        json: bool,

        /// Page to show, counting from 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Items per page; 0 shows everything
        #[arg(long, default_value_t = 0)]
        page_size: usize,
    },
    /// Resolve a gallery and apply facet selections to it
    Filter {
        #[command(flatten)]
        gallery: GalleryArgs,

        /// Facet key to toggle; repeat to select several
        #[arg(long = "select", value_name = "KEY")]
        select: Vec<String>,
    },
    /// Read and edit per-item metadata
    Meta {
        /// Storage backend
        #[arg(long, value_enum, default_value_t = Storage::File)]
        storage: Storage,

        #[command(subcommand)]
        action: MetaAction,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum Storage {
    File,
    Database,
}

#[derive(Subcommand)]
enum MetaAction {
    /// List all records of a container
    Get { container: String },
    /// Merge fields into one item's record
    Set {
        container: String,
        key: String,
        #[arg(long)]
        caption: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        alt: Option<String>,
        #[arg(long)]
        custom_url: Option<String>,
        #[arg(long)]
        custom_target: Option<String>,
    },
    /// Remove one item's record
    Delete { container: String, key: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "gallery_source=debug".to_string()
        } else {
            "gallery_source=info".to_string()
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let catalog = match &cli.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::default(),
    };
    let database = cli.database.as_deref().map(DatabaseStore::open).transpose()?;
    let file_store = FileStore::new();
    let stores = Stores {
        content: &catalog,
        taxonomy: &catalog,
        lister: &FsLister,
        file_metadata: &file_store,
        database_metadata: database.as_ref().map(|db| db as &dyn MetadataStore),
    };

    match cli.command {
        Command::Resolve {
            gallery,
            json,
            page,
            page_size,
        } => {
            let config = load_gallery_config(&gallery)?;
            let resolved = resolve_gallery(&config, &stores)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            } else {
                let hint = PagingHint { page, page_size };
                let items = resolved.page(hint);
                let offset = page.saturating_sub(1).saturating_mul(page_size);
                output::print_gallery_output(
                    &resolved,
                    items,
                    offset.min(resolved.items.len()),
                    &config.filtering.taxonomy,
                );
            }
        }
        Command::Filter { gallery, select } => {
            let config = load_gallery_config(&gallery)?;
            let resolved = resolve_gallery(&config, &stores)?;
            let history = config.filtering.history;
            let initial = FilterTransition {
                state: FilterState::new(config.filtering.mode),
                navigation: HistoryMode::Replace,
            };
            let transition = select
                .iter()
                .fold(initial, |t, key| t.state.toggle(key, history));
            let visible = resolved.filter(&transition.state);
            output::print_filter_output(&transition, &visible, resolved.items.len());
        }
        Command::Meta { storage, action } => {
            let store: &dyn MetadataStore = match storage {
                Storage::File => &file_store,
                Storage::Database => database
                    .as_ref()
                    .ok_or("--database is required for database storage")?,
            };
            run_meta(store, action)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the gallery config; a missing default `config.toml` falls back to stock settings.
fn load_gallery_config(args: &GalleryArgs) -> Result<config::GalleryConfig, config::ConfigError> {
    let explicit = args.config.as_path() != Path::new("config.toml") || args.config.exists();
    let path = explicit.then_some(args.config.as_path());
    config::load_config(path, &args.set)
}

fn run_meta(
    store: &dyn MetadataStore,
    action: MetaAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        MetaAction::Get { container } => {
            output::print_metadata_output(&store.get(&container_id(&container))?);
        }
        MetaAction::Set {
            container,
            key,
            caption,
            description,
            alt,
            custom_url,
            custom_target,
        } => {
            let patch = MetadataRecord {
                caption,
                description,
                alt,
                custom_url,
                custom_target,
            };
            let stored = store.upsert(&container_id(&container), &key, &patch)?;
            let mut records = gallery_source::metadata::RecordMap::new();
            records.insert(key, stored);
            output::print_metadata_output(&records);
        }
        MetaAction::Delete { container, key } => {
            if store.delete(&container_id(&container), &key)? {
                println!("Deleted {key}");
            } else {
                println!("No record for {key}");
            }
        }
    }
    Ok(())
}
