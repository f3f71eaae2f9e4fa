use clap::{Parser, Subcommand, ValueEnum};
use prioritytime::Store;
use std::future::Future;
use std::process;

/// PriorityTime CLI: manage a tree of leisures from the command line
#[derive(Parser)]
#[command(name = "prioritytime", version, about)]
struct Cli {
    /// Path to the data directory (default: current directory)
    #[arg(long, default_value = ".")]
    data_dir: String,

    /// Output format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Add a leisure
    Add {
        /// Display name
        name: String,
        /// Id of the parent leisure (omit for a top-level leisure)
        #[arg(long)]
        parent: Option<i64>,
    },

    /// List every leisure, parents before children
    List {
        /// Nest children under their parents
        #[arg(long)]
        tree: bool,
    },

    /// Get a single leisure by id
    Get {
        /// Leisure id
        id: i64,
    },

    /// Increment a leisure and all of its ancestors
    Increment {
        /// Leisure id
        id: i64,
    },

    /// Rename a leisure
    Rename {
        /// Leisure id
        id: i64,
        /// New display name
        name: String,
    },

    /// Remove a leisure and everything under it
    Remove {
        /// Leisure id
        id: i64,
        /// Show what would be removed without removing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show schema version, table and row count
    Status,

    /// Print the listing every time it changes, until interrupted
    Watch,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(&cli.data_dir)?;

    match cli.command {
        Command::Add { name, parent } => {
            let id = store.add_leisure(&name, parent)?;
            print_output(&serde_json::json!({ "id": id }), &cli.format)?;
        }

        Command::List { tree } => {
            let listing = store.list_dynamic(tree)?;
            print_output(&listing, &cli.format)?;
        }

        Command::Get { id } => {
            let leisure = store.get_dynamic(id)?;
            print_output(&leisure, &cli.format)?;
        }

        Command::Increment { id } => {
            let touched = store.increment_leisure(id)?;
            print_output(
                &serde_json::json!({ "ok": true, "incremented": touched }),
                &cli.format,
            )?;
        }

        Command::Rename { id, name } => {
            store.rename_leisure(id, &name)?;
            print_output(&store.get_dynamic(id)?, &cli.format)?;
        }

        Command::Remove { id, dry_run } => {
            if dry_run {
                let subtree = store.subtree(id)?;
                print_output(
                    &serde_json::json!({
                        "dry_run": true,
                        "would_remove": subtree.size(),
                        "subtree": subtree,
                    }),
                    &cli.format,
                )?;
            } else {
                let removed = store.remove_leisure(id)?;
                print_output(
                    &serde_json::json!({ "ok": true, "removed": removed }),
                    &cli.format,
                )?;
            }
        }

        Command::Status => {
            let result = store.status()?;
            print_output(&result, &cli.format)?;
        }

        Command::Watch => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(watch(&store, &cli.format, tokio::signal::ctrl_c()))?;
        }
    }

    Ok(())
}

/// Print the listing, then print it again after every change, until
/// `shutdown` resolves. Commits from other processes are picked up by polling
/// at the configured interval.
async fn watch(
    store: &Store,
    format: &OutputFormat,
    shutdown: impl Future<Output = std::io::Result<()>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut observer = store.observe();
    let mut ticker = tokio::time::interval(store.config().poll_interval());
    let listing = observer.current();
    print_output(&serde_json::to_value(listing)?, format)?;

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                log::info!("Interrupted, stopping watch");
                break;
            }
            _ = ticker.tick() => {
                store.process_external_changes()?;
                if observer.has_changed() {
                    let listing = observer.current();
                    print_output(&serde_json::to_value(listing)?, format)?;
                }
            }
        }
    }

    Ok(())
}

fn print_output(
    value: &serde_json::Value,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => {
            // Separate successive watch snapshots into YAML documents.
            println!("---");
            print!("{}", serde_yaml::to_string(value)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_watch_stops_on_shutdown_spanning_several_ticks() {
        let store = Store::open_in_memory().unwrap();
        store.add_leisure("Reading", None).unwrap();

        // Longer than the poll interval, so the loop ticks before shutdown.
        let shutdown = async {
            tokio::time::sleep(store.config().poll_interval() * 3).await;
            Ok::<(), std::io::Error>(())
        };

        let stopped = tokio::time::timeout(
            Duration::from_secs(10),
            watch(&store, &OutputFormat::Json, shutdown),
        )
        .await;
        assert!(matches!(stopped, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_watch_reports_shutdown_error() {
        let store = Store::open_in_memory().unwrap();
        let shutdown = async { Err::<(), _>(std::io::Error::other("no signal handler")) };

        let result = watch(&store, &OutputFormat::Yaml, shutdown).await;
        assert!(result.is_err());
    }
}
