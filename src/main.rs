use clap::{Parser, Subcommand};
use colunch::config::AppConfig;
use colunch::server::{self, AppState};
use colunch::sources::ImagePayload;
use colunch::RecipeBook;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "colunch", version, about = "Recipe generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web app
    Serve {
        /// Listen address, overrides server.addr
        #[arg(long)]
        addr: Option<String>,
    },
    /// Create and store a recipe, then print it
    Create {
        /// What to cook; may contain recipe web page or YouTube links
        #[arg(default_value = "")]
        description: String,
        /// Photo of a dish, menu or ingredients
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    /// Find stored recipes similar to a phrase
    Search {
        query: String,
        /// Number of results
        #[arg(short, default_value_t = 5)]
        n: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let book = RecipeBook::from_config(&config).await?;

    match cli.command {
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            let state = AppState::new(book, config.server);
            server::serve(state, &addr).await?;
        }
        Command::Create {
            description,
            images,
        } => {
            let mut payloads = Vec::with_capacity(images.len());
            for path in &images {
                payloads.push(ImagePayload::from_path(path).await?);
            }
            let recipe = book.create(&description, &payloads, None).await?;
            info!("Stored recipe {}", recipe.id);
            println!("# {}\n\n_{}_\n\n{}", recipe.name, recipe.summary, recipe.content);
        }
        Command::Search { query, n } => {
            for recipe in book.search(&query, n).await? {
                println!("{}  {} - {}", recipe.id, recipe.name, recipe.summary);
            }
        }
    }

    Ok(())
}
