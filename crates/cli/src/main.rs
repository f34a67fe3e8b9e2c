use anyhow::Context;
use bookmate_app::modules::books::{
    models::{GenreFilter, SortKey, ViewQuery},
    view,
};
use bookmate_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookmate-cli", version, about = "Operate a BookMate deployment")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Print the shared list the way the browse view derives it
    Books {
        /// Case-insensitive match on title or author
        #[arg(long, default_value = "")]
        search: String,
        /// `All` or one genre label, e.g. `Sci-Fi`
        #[arg(long, default_value = "All")]
        genre: GenreFilter,
        /// latest, oldest or most-liked
        #[arg(long, default_value = "latest")]
        sort: SortKey,
    },
    /// Print the resolved settings
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load BookMate settings")?;
    bookmate_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => bookmate_app::serve(settings).await,
        Command::Books {
            search,
            genre,
            sort,
        } => {
            let store = bookmate_app::store::from_settings(&settings)?;
            let books = store
                .list_books()
                .await
                .with_context(|| "failed to fetch books")?;
            let query = ViewQuery {
                search,
                genre,
                sort,
            };
            for book in view::derive_view(&books, &query) {
                println!(
                    "{}\t{}\t{}\t{}\t{}/5\t{} likes",
                    book.id, book.title, book.author, book.genre, book.rating, book.likes
                );
            }
            Ok(())
        }
        Command::Config => {
            println!("environment: {:?}", settings.environment);
            println!(
                "server: {}:{} (timeout {}ms)",
                settings.server.host, settings.server.port, settings.server.request_timeout_ms
            );
            println!(
                "store: {:?} endpoint={:?} seed_sample_data={}",
                settings.store.backend, settings.store.endpoint, settings.store.seed_sample_data
            );
            println!(
                "auth: {:?} sign_in_url={} static_tokens={}",
                settings.auth.provider,
                settings.auth.sign_in_url,
                settings.auth.tokens.len()
            );
            println!(
                "telemetry: {:?} filter={}",
                settings.telemetry.log_format, settings.telemetry.filter
            );
            tracing::debug!("settings printed");
            Ok(())
        }
    }
}
