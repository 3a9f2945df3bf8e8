use anyhow::Context;
use clap::Parser;
use nr_cli::logging::init_logging;
use nr_cli::{output, BookmarkCommands, Cli, Commands};
use nr_core::Error;
use nr_reader::{Reader, SearchQuery};
use nr_web::{create_app, AppState};
use tracing::{info, warn};

/// Signs in with the given account, creating it on first use, or as a guest.
async fn sign_in(reader: &Reader, cli: &Cli) -> anyhow::Result<()> {
    let session = reader.session();
    let signed_in = match (&cli.email, &cli.password) {
        (Some(email), Some(password)) => match session.signin(email, password).await {
            Err(Error::Auth(_)) => {
                warn!("No account for {}, creating one", email);
                session.signup(None, email, password).await?
            }
            other => other?,
        },
        _ => session.guest_signin().await?,
    };
    info!("👤 Signed in as {}", signed_in.display_name.as_deref().unwrap_or(&signed_in.uid));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.reader_config()?;
    info!("💾 Opening {} store, {:?} articles", config.storage, config.source_mode());
    let reader = Reader::new(config).await.context("failed to set up the reader")?;

    if cli.needs_session() {
        sign_in(&reader, &cli).await?;
    }

    match &cli.command {
        Commands::Feed { category } => {
            let articles = reader.feed.latest(category.as_deref()).await?;
            println!("{}", output::article_list(&articles));
        }
        Commands::Search { query, category, from, to, sort } => {
            let query = SearchQuery::from_params(
                Some(query.as_str()),
                category.as_deref(),
                from.as_deref(),
                to.as_deref(),
                sort.as_deref(),
            )?;
            info!("🔍 Searching for {:?} ({})", query.text, query.sort);
            let results = reader.search.run_search(&query).await?;
            println!("{}", output::article_list(&results));
        }
        Commands::Post { id } => match reader.load_post(id).await? {
            Some(view) => println!("{}", output::post(&view)),
            None => warn!("Post {} was superseded by a newer load", id),
        },
        Commands::Like { id } => {
            let liked = reader.toggle_like(id).await?;
            let interaction = reader.interactions.load_interactions(id).await?;
            println!(
                "{} {} ({} likes)",
                if liked { "Liked" } else { "Unliked" },
                id,
                interaction.likes_count()
            );
        }
        Commands::Comment { id, text } => {
            let comment = reader.add_comment(id, text).await?;
            println!("Commented on {} as {}", id, comment.author.user_name);
        }
        Commands::Bookmarks { command } => match command {
            BookmarkCommands::List => {
                println!("{}", output::bookmark_list(&reader.saved_bookmarks().await?));
            }
            BookmarkCommands::Add { id } => {
                let bookmark = reader.save_bookmark(id).await?;
                println!("🔖 Saved {}", bookmark.article.title);
            }
            BookmarkCommands::Remove { id } => {
                reader.remove_bookmark(id).await?;
                println!("Removed {}", id);
            }
        },
        Commands::Serve { addr } => {
            let app = create_app(AppState { reader: reader.clone() }).await;
            let listener = tokio::net::TcpListener::bind(*addr)
                .await
                .with_context(|| format!("failed to bind {}", addr))?;
            info!("🌐 Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    reader.session().teardown();
    Ok(())
}
