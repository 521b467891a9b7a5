//! CLI entry point for inkpost

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inkpost::content::MarkdownRenderer;
use inkpost::Site;

#[derive(Parser)]
#[command(name = "inkpost")]
#[command(version = "0.1.0")]
#[command(about = "A markdown content engine for static personal blogs", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List content records, newest first
    List {
        /// Restrict to one category label
        category: Option<String>,
    },

    /// Render a single content item to HTML on stdout
    Render {
        /// Slug of the content item
        slug: String,

        /// Category label the slug belongs to
        #[arg(short = 'C', long)]
        category: String,
    },

    /// Render all content into the public directory
    #[command(alias = "b")]
    Build,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "inkpost=debug,info"
    } else {
        "inkpost=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = cli.cwd.unwrap_or_else(|| std::env::current_dir().unwrap());
    let site = Site::new(&base_dir)?;

    match cli.command {
        Commands::List { category } => {
            let repo = site.repository();
            let records = match category {
                Some(label) => match site.config.category(&label) {
                    Some(cat) => repo.load_category(&cat.dir, &cat.label),
                    None => bail!("Unknown category: {}", label),
                },
                None => repo.load_all(),
            };

            for record in &records {
                println!(
                    "{}  {:<14} {:<32} {}",
                    record.published_at, record.category, record.slug, record.title
                );
            }
            tracing::debug!("Listed {} records", records.len());
        }

        Commands::Render { slug, category } => {
            let Some(cat) = site.config.category(&category) else {
                bail!("Unknown category: {}", category);
            };

            let repo = site.repository();
            let Some((_, body)) = repo.load_content(&cat.dir, &cat.label, &slug) else {
                bail!("Content not found: {}/{}", cat.label, slug);
            };

            let renderer = MarkdownRenderer::new();
            print!("{}", renderer.render(&body)?);
        }

        Commands::Build => {
            tracing::info!("Building site from {:?}", site.content_dir);
            site.build()?;
            println!("Generated successfully!");
        }
    }

    Ok(())
}
