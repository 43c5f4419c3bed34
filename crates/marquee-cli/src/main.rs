use std::sync::Arc;

use clap::{Parser, Subcommand};

mod output;

use marquee_core::{
    Config, DetailLoader, DetailState, FavoritesStore, OmdbBackend, SearchSession, SearchState,
    config_file,
};
use output::ColorMode;

/// Movie search with scroll-style pagination and local favorites
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search movies by title, fetching result pages incrementally
    Search {
        /// Title to search for (falls back to the configured default query)
        query: Option<String>,

        /// Maximum number of result pages to fetch
        #[arg(short, long, default_value_t = 1)]
        pages: u32,

        /// OMDb API key
        #[arg(long)]
        api_key: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show the full record for a movie id
    Detail {
        /// IMDb id, e.g. tt2788710
        imdb_id: String,

        /// OMDb API key
        #[arg(long)]
        api_key: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Manage favorite movies
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommand,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesCommand {
    /// List stored favorites
    List {
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Fetch a movie by id and store it as a favorite
    Add {
        /// IMDb id, e.g. tt2788710
        imdb_id: String,

        /// OMDb API key
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Remove a favorite by id
    Remove {
        /// IMDb id, e.g. tt2788710
        imdb_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Search {
            query,
            pages,
            api_key,
            no_color,
        } => search(query, pages, api_key, no_color).await,
        Command::Detail {
            imdb_id,
            api_key,
            no_color,
        } => detail(imdb_id, api_key, no_color).await,
        Command::Favorites { command } => favorites(command).await,
    }
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
fn resolve_config(api_key: Option<String>) -> (Config, config_file::ConfigFile) {
    let file = config_file::load_config();
    let mut config = file.to_config();
    if let Some(key) = api_key.or_else(|| std::env::var("OMDB_API_KEY").ok()) {
        config.api_key = key;
    }
    (config, file)
}

fn require_api_key(config: &Config) -> anyhow::Result<()> {
    if config.api_key.is_empty() {
        anyhow::bail!(
            "no API key configured; pass --api-key, set OMDB_API_KEY, or add it to the config file"
        );
    }
    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<Arc<FavoritesStore>> {
    let store = match &config.favorites_path {
        Some(path) => FavoritesStore::open(path)?,
        None => FavoritesStore::open_in_memory()?,
    };
    Ok(Arc::new(store))
}

async fn search(
    query: Option<String>,
    pages: u32,
    api_key: Option<String>,
    no_color: bool,
) -> anyhow::Result<()> {
    let (config, file) = resolve_config(api_key);
    require_api_key(&config)?;

    let query = query
        .or_else(|| file.default_query())
        .unwrap_or_else(|| "Interview".into());
    let color = ColorMode(!no_color);
    let mut stdout = std::io::stdout();

    let backend = Arc::new(OmdbBackend::from_config(&config));
    let session = SearchSession::new(backend, &config);
    let mut rx = session.subscribe();

    session.submit(&query);

    let mut rendered = 0usize;
    loop {
        rx.changed().await?;
        let state = rx.borrow_and_update().clone();
        match state {
            SearchState::Loaded {
                items,
                total_results,
            } => {
                if rendered == 0 {
                    output::print_header(&mut stdout, &query, total_results, color)?;
                }
                output::print_items(&mut stdout, &items[rendered..], rendered, color)?;
                rendered = items.len();

                let pager = session.pager();
                if pager.is_last_page() || pager.current_page() >= pages {
                    output::print_footer(
                        &mut stdout,
                        rendered,
                        total_results,
                        pager.is_last_page(),
                        color,
                    )?;
                    break;
                }
                session.scroll_near_end();
            }
            SearchState::Error => {
                anyhow::bail!("search for \"{}\" failed", query);
            }
            SearchState::Idle | SearchState::InProgress => {}
        }
    }
    Ok(())
}

async fn detail(imdb_id: String, api_key: Option<String>, no_color: bool) -> anyhow::Result<()> {
    let (config, _) = resolve_config(api_key);
    require_api_key(&config)?;
    let color = ColorMode(!no_color);

    let backend = Arc::new(OmdbBackend::from_config(&config));
    let store = open_store(&config)?;
    let loader = DetailLoader::new(backend, &config, store);
    let mut rx = loader.subscribe();

    loader.fetch(&imdb_id);
    loop {
        rx.changed().await?;
        match rx.borrow_and_update().clone() {
            DetailState::Loaded(record) => {
                let favorite = loader.is_favorite()?;
                output::print_detail(&mut std::io::stdout(), &record, favorite, color)?;
                break;
            }
            DetailState::Error => {
                anyhow::bail!("could not fetch details for {}", imdb_id);
            }
            DetailState::Idle | DetailState::InProgress => {}
        }
    }
    Ok(())
}

async fn favorites(command: FavoritesCommand) -> anyhow::Result<()> {
    match command {
        FavoritesCommand::List { no_color } => {
            let (config, _) = resolve_config(None);
            let store = open_store(&config)?;
            output::print_favorites(
                &mut std::io::stdout(),
                &store.list()?,
                ColorMode(!no_color),
            )?;
            Ok(())
        }
        FavoritesCommand::Add { imdb_id, api_key } => {
            let (config, _) = resolve_config(api_key);
            require_api_key(&config)?;

            let backend = Arc::new(OmdbBackend::from_config(&config));
            let store = open_store(&config)?;
            let loader = DetailLoader::new(backend, &config, store);
            let mut rx = loader.subscribe();

            loader.fetch(&imdb_id);
            loop {
                rx.changed().await?;
                match rx.borrow_and_update().clone() {
                    DetailState::Loaded(record) => {
                        if !loader.is_favorite()? {
                            loader.toggle_favorite()?;
                        }
                        println!("Added \"{}\" to favorites", record.title);
                        break;
                    }
                    DetailState::Error => {
                        anyhow::bail!("could not fetch details for {}", imdb_id);
                    }
                    DetailState::Idle | DetailState::InProgress => {}
                }
            }
            Ok(())
        }
        FavoritesCommand::Remove { imdb_id } => {
            let (config, _) = resolve_config(None);
            let store = open_store(&config)?;
            if store.remove(&imdb_id)? {
                println!("Removed {} from favorites", imdb_id);
            } else {
                println!("{} is not a favorite", imdb_id);
            }
            Ok(())
        }
    }
}
