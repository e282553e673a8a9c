use clap::{Parser, Subcommand};

mod api;
mod entities;
mod server;

use crate::api::seo::{robots_document, sitemap_document};
use crate::api::AppState;

#[derive(Parser, Debug)]
#[command(name = "sitecms", about = "Content and SEO backend of a business website")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service
    Server {},

    /// Print sitemap.xml
    Sitemap {},

    /// Print robots.txt
    Robots {},
}

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server {} => server::run().await,
        Commands::Sitemap {} => {
            let appstate = AppState::new().await?;

            println!("{}", sitemap_document(&appstate).await.trim_end());
            Ok(())
        }
        Commands::Robots {} => {
            let appstate = AppState::new().await?;

            println!("{}", robots_document(&appstate).await);
            Ok(())
        }
    }
}
