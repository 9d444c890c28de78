use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use partvault::api;
use partvault::vault::Vault;

#[derive(Parser)]
#[command(name = "partvault")]
#[command(about = "File-based version control and lifecycle management for CAD design files")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the PartVault gateway server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "7410")]
        port: u16,
    },
    /// Create the Working/ and Parts/ folders under a project root
    Init {
        /// Project root directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },
    /// Freeze the working copy as the next version
    Freeze {
        /// Tracked file name, e.g. Bracket.SLDPRT
        file: String,

        /// Change note recorded on the version
        #[arg(short = 'm', long = "note", default_value = "")]
        note: String,

        /// Author recorded on the version (defaults to the local username)
        #[arg(short, long)]
        author: Option<String>,

        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },
    /// Release an existing version as the approved revision
    Release {
        file: String,

        /// Version identifier, e.g. v002
        version: String,

        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },
    /// Copy a version back into the working copy for further editing
    Rework {
        file: String,

        /// Version identifier, e.g. v002
        version: String,

        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },
    /// Show a part's version history
    History {
        file: String,

        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },
    /// Show a part's lifecycle state
    Status {
        file: String,

        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },
    /// List all tracked parts in a project
    Parts {
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "partvault=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting PartVault gateway on port {}", port);

    let app = api::create_router(Vault::default());

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("PartVault gateway listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let vault = Vault::default();

    match cli.command {
        Some(Commands::Serve { port }) => serve(port).await?,
        Some(Commands::Init { project }) => {
            vault.init_project(&project)?;
            println!("Initialized vault at {}", project.display());
        }
        Some(Commands::Freeze {
            file,
            note,
            author,
            project,
        }) => {
            let record = vault.freeze(&project, &file, author.as_deref(), &note)?;
            println!(
                "Froze {} as {} ({} bytes)",
                record.file_name, record.version, record.file_size
            );
        }
        Some(Commands::Release {
            file,
            version,
            project,
        }) => {
            vault.release(&project, &file, &version)?;
            println!("Released {} {}", file, version);
        }
        Some(Commands::Rework {
            file,
            version,
            project,
        }) => {
            vault.rework(&project, &file, &version)?;
            println!("Reworked {} {} into the working copy", file, version);
        }
        Some(Commands::History { file, project }) => {
            let history = vault.version_history(&project, &file)?;
            if history.is_empty() {
                println!("No versions for {}", file);
            } else {
                println!(
                    "{:<8} {:<14} {:<17} {:>10}  {}",
                    "VERSION", "AUTHOR", "CREATED", "SIZE", "NOTE"
                );
                for record in history {
                    println!(
                        "{:<8} {:<14} {:<17} {:>10}  {}",
                        record.version.to_string(),
                        record.author,
                        record.created_at.format("%Y-%m-%d %H:%M").to_string(),
                        record.file_size,
                        record.change_note
                    );
                }
            }
        }
        Some(Commands::Status { file, project }) => {
            let summary = vault.part_summary(&project, &file)?;
            let locked = vault.working_copy_locked(&project, &file)?;
            println!("part:     {}", summary.name);
            println!("state:    {}", summary.state);
            println!("latest:   {}", summary.latest_version);
            println!(
                "released: {}",
                summary.released_version.as_deref().unwrap_or("-")
            );
            println!("working:  {}", if locked { "locked" } else { "editable" });
        }
        Some(Commands::Parts { project }) => {
            let parts = vault.list_parts(&project)?;
            if parts.is_empty() {
                println!("No tracked parts");
            } else {
                println!(
                    "{:<24} {:<10} {:<8} {}",
                    "PART", "STATE", "LATEST", "RELEASED"
                );
                for part in parts {
                    println!(
                        "{:<24} {:<10} {:<8} {}",
                        part.name,
                        part.state.to_string(),
                        part.latest_version,
                        part.released_version.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        None => serve(7410).await?,
    }

    Ok(())
}
