//! FileHub CLI: command-line client for the FileHub file service.
//!
//! Reads FILEHUB_API_URL and FILEHUB_USER_API_URL (or FILEHUB_USER_ID to skip
//! the identity service). Every request carries the X-User-Id header.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use filehub_cli::{connect, format_upload_row, init_tracing, parse_date, TABLE_HEADER};
use filehub_core::{ClientConfig, FilterSet};
use filehub_sync::FileCandidate;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "filehub", about = "FileHub file service CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved user
    Whoami,
    /// Check that the file service is running
    Health,
    /// Application and location operations
    Apps {
        #[command(subcommand)]
        sub: AppCommands,
    },
    /// Upload a file to an application location
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Application ID
        #[arg(long)]
        app: i64,
        /// Location ID (must belong to the application)
        #[arg(long)]
        location: i64,
        /// Optional sub-path under the location
        #[arg(long)]
        path: Option<String>,
    },
    /// List uploads with optional filters
    Files {
        #[command(flatten)]
        filters: FilterArgs,
        /// Print a table instead of JSON
        #[arg(long)]
        table: bool,
    },
    /// Download an upload into a directory
    Download {
        /// Upload ID
        id: i64,
        /// Destination directory
        #[arg(long, default_value = ".")]
        dest: PathBuf,
    },
    /// Share an upload with another user
    Share {
        /// Upload ID
        id: i64,
        /// Recipient user name
        recipient: String,
        /// Ask the server to notify the recipient by email
        #[arg(long)]
        email: bool,
    },
}

#[derive(Subcommand)]
enum AppCommands {
    /// List applications
    List {
        /// Only show applications whose name contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Create an application
    Create {
        /// Application name
        name: String,
    },
    /// List the locations of an application
    Locations {
        /// Application ID
        app: i64,
    },
    /// Add a location to an application
    AddLocation {
        /// Application ID
        app: i64,
        /// Location name
        name: String,
        /// Server-side path
        path: String,
    },
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Uploaded on or after (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,
    /// Uploaded on or before (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,
    /// Filename search text
    #[arg(long)]
    search: Option<String>,
    /// Application ID
    #[arg(long)]
    app: Option<i64>,
    /// Location ID
    #[arg(long)]
    location: Option<i64>,
}

impl From<FilterArgs> for FilterSet {
    fn from(args: FilterArgs) -> Self {
        FilterSet {
            from_date: args.from,
            to_date: args.to,
            search: args.search,
            application_id: args.app,
            location_id: args.location,
        }
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("Invalid FileHub configuration")?;
    tracing::debug!(api_url = %config.api_url, environment = %config.environment, "Configuration loaded");

    let workspace = connect(&config).await?;

    match cli.command {
        Commands::Whoami => {
            let user = workspace
                .current_user()
                .await
                .context("No active session")?;
            print_json(&*user)?;
        }
        Commands::Health => {
            let health = workspace.health().await?;
            print_json(&health)?;
        }
        Commands::Apps { sub } => {
            let hierarchy = workspace.hierarchy();
            match sub {
                AppCommands::List { filter } => {
                    hierarchy.list_applications().await?;
                    let apps = hierarchy
                        .find_applications(filter.as_deref().unwrap_or(""))
                        .await;
                    print_json(&apps)?;
                }
                AppCommands::Create { name } => {
                    let app = hierarchy.create_application(&name).await?;
                    print_json(&app)?;
                }
                AppCommands::Locations { app } => {
                    let locations = hierarchy.list_locations(app).await?;
                    print_json(&locations)?;
                }
                AppCommands::AddLocation { app, name, path } => {
                    let location = hierarchy.create_location(app, &name, &path).await?;
                    print_json(&location)?;
                }
            }
        }
        Commands::Upload {
            file,
            app,
            location,
            path,
        } => {
            let mut controller = workspace.upload_controller();
            let candidate = FileCandidate::from_path(&file)
                .await
                .with_context(|| format!("Cannot read {}", file.display()))?;

            controller.select_application(app).await?;
            controller.select_location(location).await?;
            controller.select_file(candidate).await?;
            controller.set_additional_path(path.as_deref());

            let mut progress = controller.progress_rx();
            let reporter = tokio::spawn(async move {
                while progress.changed().await.is_ok() {
                    let value = *progress.borrow_and_update();
                    eprint!("\rUploading... {:>3}%", value);
                }
                eprintln!();
            });

            let result = controller.submit().await;
            drop(controller);
            let _ = reporter.await;
            print_json(&result?)?;
        }
        Commands::Files { filters, table } => {
            let registry = workspace.registry();
            registry.query(filters.into()).await?;
            let uploads = registry.uploads().await;
            if table {
                println!("{}", TABLE_HEADER);
                for upload in &uploads {
                    println!("{}", format_upload_row(upload));
                }
            } else {
                print_json(&uploads)?;
            }
        }
        Commands::Download { id, dest } => {
            let registry = workspace.registry();
            registry.query(FilterSet::default()).await?;
            let saved = registry.download(id, &dest).await?;
            let upload = registry.find(id).await;
            print_json(&serde_json::json!({
                "saved_to": saved,
                "download_count": upload.map(|u| u.download_count),
            }))?;
        }
        Commands::Share {
            id,
            recipient,
            email,
        } => {
            let message = workspace
                .registry()
                .share(id, &recipient, email.then_some(true))
                .await?;
            print_json(&serde_json::json!({
                "success": true,
                "message": message.unwrap_or_else(|| format!("Upload {} shared with {}", id, recipient)),
            }))?;
        }
    }

    Ok(())
}
