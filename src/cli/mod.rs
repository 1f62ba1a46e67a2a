//! Command-line interface for dropspot.
//!
//! Provides commands for dropping and managing content, inspecting expiry
//! state, running the sweep daemon, and following live updates.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config;
use crate::expiry::{ExpiryOption, SweepScheduler};
use crate::service::Service;
use crate::store::{Category, EntryId};

/// dropspot - self-hosted ephemeral content store
#[derive(Parser, Debug)]
#[command(name = "dropspot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the sweep daemon until interrupted
    Serve,

    /// Drop a text snippet (reads from stdin if no input file)
    Add {
        /// Name for the snippet
        name: String,

        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Expiry option: Never, "1 hour", "4 hours", "1 day" or e.g. 30m/2h/1d/1w/1M/1y
        #[arg(short, long, default_value = "Never")]
        expire: String,

        /// Store as a notepad page instead of a text snippet
        #[arg(long)]
        notepad: bool,
    },

    /// Drop a file
    Upload {
        /// File to store
        path: PathBuf,

        /// Name to store it under (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Expiry option
        #[arg(short, long, default_value = "Never")]
        expire: String,
    },

    /// Drop a link
    Link {
        /// URL to store
        url: String,

        /// Expiry option
        #[arg(short, long, default_value = "Never")]
        expire: String,
    },

    /// List entries in a category (or all categories)
    List {
        /// Category: text, files, links, notepad
        category: Option<String>,
    },

    /// Print an entry's content
    Show {
        /// Entry identifier, e.g. text/notes.md
        id: String,
    },

    /// Delete an entry
    Delete {
        /// Entry identifier
        id: String,
    },

    /// Rename an entry, keeping its expiry
    Rename {
        /// Entry identifier
        id: String,

        /// New name
        new_name: String,
    },

    /// Set or clear an entry's expiry
    Expire {
        /// Entry identifier
        id: String,

        /// Expiry option
        option: String,
    },

    /// Sweep expired entries once
    Sweep,

    /// Follow live updates, printing each stream frame
    Watch,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = config::config()?;

        match self.command {
            Commands::Serve => {
                let service = Service::open(config).await?;
                let scheduler = SweepScheduler::new(config.sweep_interval());
                let handle = scheduler.start(service.tracker());

                println!(
                    "dropspot serving {} (sweep every {:?}, Ctrl-C to stop)",
                    config.data.display(),
                    scheduler.interval()
                );
                tokio::signal::ctrl_c()
                    .await
                    .context("Failed to listen for Ctrl-C")?;

                handle.stop().await?;
                Ok(())
            }

            Commands::Add {
                name,
                input,
                expire,
                notepad,
            } => {
                let bytes = read_input(input)?;
                let category = if notepad {
                    Category::Notepad
                } else {
                    Category::Text
                };

                let service = Service::open(config).await?;
                let id = service
                    .add(category, &name, &bytes, &ExpiryOption::parse(&expire))
                    .await?;
                println!("{}", id);
                Ok(())
            }

            Commands::Upload { path, name, expire } => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let name = name.unwrap_or_else(|| {
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default()
                });

                let service = Service::open(config).await?;
                let id = service
                    .add(Category::Files, &name, &bytes, &ExpiryOption::parse(&expire))
                    .await?;
                println!("{}", id);
                Ok(())
            }

            Commands::Link { url, expire } => {
                let service = Service::open(config).await?;
                let id = service
                    .add_link(&url, &ExpiryOption::parse(&expire))
                    .await?;
                println!("{}", id);
                Ok(())
            }

            Commands::List { category } => {
                let service = Service::open(config).await?;

                let categories: Vec<Category> = match category {
                    Some(s) => vec![s.parse()?],
                    None => Category::ALL.to_vec(),
                };

                for category in categories {
                    let rows = service.list(category).await?;
                    if rows.is_empty() {
                        continue;
                    }
                    println!("{}:", category);
                    for row in rows {
                        match row.expires_at {
                            Some(deadline) => println!(
                                "  {}  (expires {})",
                                row.id.name,
                                deadline.to_rfc3339()
                            ),
                            None => println!("  {}", row.id.name),
                        }
                    }
                }
                Ok(())
            }

            Commands::Show { id } => {
                let id: EntryId = id.parse()?;
                let service = Service::open(config).await?;
                let bytes = service.read(&id).await?;
                io::Write::write_all(&mut io::stdout(), &bytes)?;
                Ok(())
            }

            Commands::Delete { id } => {
                let id: EntryId = id.parse()?;
                let service = Service::open(config).await?;
                service.delete(&id).await?;
                println!("Deleted {}", id);
                Ok(())
            }

            Commands::Rename { id, new_name } => {
                let id: EntryId = id.parse()?;
                let service = Service::open(config).await?;
                let new_id = service.rename(&id, &new_name).await?;
                println!("{}", new_id);
                Ok(())
            }

            Commands::Expire { id, option } => {
                let id: EntryId = id.parse()?;
                let option = ExpiryOption::parse(&option);

                let service = Service::open(config).await?;
                service.set_expiration(&id, &option).await?;

                match service.tracker().deadline(&id).await {
                    Some(deadline) => println!("{} expires {}", id, deadline.to_rfc3339()),
                    None => println!("{} never expires", id),
                }
                Ok(())
            }

            Commands::Sweep => {
                let service = Service::open(config).await?;
                let removed = service.sweep().await;
                println!("Removed {} expired entr(ies)", removed.len());
                for id in removed {
                    println!("  {}", id);
                }
                Ok(())
            }

            Commands::Watch => {
                let service = Service::open(config).await?;
                let scheduler = SweepScheduler::new(config.sweep_interval());
                let handle = scheduler.start(service.tracker());

                let mut subscription = service.subscribe();
                loop {
                    tokio::select! {
                        message = subscription.recv() => match message {
                            Some(message) => print!("{}", message.sse_frame()),
                            None => break,
                        },
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }

                handle.stop().await?;
                Ok(())
            }

            Commands::Config => {
                println!("home:           {}", config.home.display());
                println!("data:           {}", config.data.display());
                println!("expiry file:    {}", config.expiry_path().display());
                println!("sweep interval: {}s", config.sweep_interval_secs);
                println!("presets:        {}", config.expiry_presets.join(", "));
                match &config.config_file {
                    Some(path) => println!("config file:    {}", path.display()),
                    None => println!("config file:    (none found)"),
                }
                Ok(())
            }
        }
    }
}

/// Read bytes from a file or stdin
fn read_input(input: Option<PathBuf>) -> Result<Vec<u8>> {
    match input {
        Some(path) => std::fs::read(&path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}
