use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone)]
#[command(
    display_name = "Rating Processor",
    long_about = "Aggregates item ratings into globally unique average scores"
)]
pub struct Args {
    /// The catalog document enumerating the rateable items. Item
    /// identifiers are discovered recursively, whatever the nesting shape.
    #[arg(short, long, env = "CATALOG_PATH", help = "Path to the item catalog JSON")]
    pub catalog_path: PathBuf,

    /// Where the score store lives. Created from the catalog on first use.
    #[arg(
        short,
        long,
        env = "STORE_PATH",
        default_value = "global-index.json",
        help = "Path to the persisted score store"
    )]
    pub store_path: PathBuf,

    /// A batch file: a JSON array of {"index": 1..10, "image": <item-id>}
    /// objects, applied in order.
    #[arg(short, long, env = "BATCH_PATH", help = "Path to the batch to apply")]
    pub batch_path: PathBuf,

    /// How long a request may wait for the store lock before it fails
    #[arg(long, default_value_t = 10, help = "Store lock wait in seconds")]
    pub lock_wait_secs: u64,

    /// Publish a batch-processed event to RabbitMQ after a successful run
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub publish: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "RUST_LOG",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        help = "Sets the logging verbosity"
    )]
    pub log_level: String
}
