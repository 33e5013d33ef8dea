//! Milestones Engine - command line entry point.
//!
//! The engine is a library meant to be embedded in a game server. This binary
//! validates configuration files and runs one-off simulations against the
//! in-memory adapters.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use milestones_domain::UserId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use milestones_engine::infrastructure::catalog_loader::{
    load_progression_catalog, load_tutorial_catalog,
};
use milestones_engine::infrastructure::settings::EngineSettings;
use milestones_engine::App;

#[derive(Parser)]
#[command(name = "milestones-engine")]
#[command(version, about = "Progression and tutorial engine tooling")]
struct Cli {
    /// Progression configuration file (overrides PROGRESSION_CONFIG_PATH)
    #[arg(long, global = true)]
    progressions: Option<PathBuf>,

    /// Tutorial configuration file (overrides TUTORIALS_CONFIG_PATH)
    #[arg(long, global = true)]
    tutorials: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load both catalogs and print the progression evaluation order
    Validate,

    /// Run Get for one user against empty in-memory stores and print JSON
    Simulate {
        /// User to simulate
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "milestones_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut settings = EngineSettings::from_env();
    if let Some(path) = cli.progressions {
        settings.progression_config_path = path;
    }
    if let Some(path) = cli.tutorials {
        settings.tutorials_config_path = path;
    }

    let progressions = load_progression_catalog(&settings.progression_config_path).await?;
    let tutorials = load_tutorial_catalog(&settings.tutorials_config_path).await?;

    match cli.command {
        Commands::Validate => {
            println!(
                "{} progressions, {} tutorials",
                progressions.len(),
                tutorials.len()
            );
            for (position, id) in progressions.evaluation_order().iter().enumerate() {
                println!("{:>4}  {}", position + 1, id);
            }
        }
        Commands::Simulate { user } => {
            let user_id = UserId::new(user).context("invalid --user")?;
            let (app, _adapters) = App::in_memory(Arc::new(progressions), Arc::new(tutorials));
            let app = app.with_request_timeout(settings.request_timeout);

            let progression = app
                .progression
                .get
                .execute(&app.request_context(), &user_id, None)
                .await?;
            let tutorials = app
                .tutorials
                .get
                .execute(&app.request_context(), &user_id)
                .await?;

            let output = serde_json::json!({
                "user_id": user_id,
                "progressions": progression,
                "tutorials": tutorials,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
