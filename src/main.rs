use std::{process, time::Duration};

use clap::Parser;
use rating_processor::{
    api,
    args::Args,
    messaging::{RabbitMqConfig, RatingEventPublisher},
    model::{BatchSummary, RatingAggregator},
    store::JsonStore
};
use tracing::{error, info, warn};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level);

    let body = match std::fs::read_to_string(&args.batch_path) {
        Ok(body) => body,
        Err(e) => {
            error!(path = %args.batch_path.display(), "failed to read batch file: {e}");
            process::exit(1);
        }
    };

    // The batch file goes through the same ingress contract a transport
    // layer would use
    let entries = match api::parse_submission("POST", &body) {
        Ok(entries) => entries,
        Err(e) => {
            error!(status = e.status_code(), "rejected batch: {e}");
            process::exit(1);
        }
    };

    let store = JsonStore::new(&args.store_path, &args.catalog_path)
        .with_lock_wait(Duration::from_secs(args.lock_wait_secs));
    let aggregator = RatingAggregator::new(store);

    let summary = match aggregator.apply_batch(&entries).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("batch failed: {e}");
            process::exit(1);
        }
    };

    info!(
        applied = summary.applied,
        discarded = summary.discarded_total(),
        total_ratings = summary.total_stats.total_sum_number,
        rated_items = summary.total_stats.total_rated_item_number,
        "batch applied"
    );
    for (reason, count) in &summary.discarded {
        info!("discarded {count} entries: {reason}");
    }

    if args.publish {
        publish_event(&summary).await;
    }
}

/// Best-effort event publication; the store is already persisted, so
/// failures here are logged and swallowed.
async fn publish_event(summary: &BatchSummary) {
    let config = match RabbitMqConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!("publishing requested but RabbitMQ is not configured: {e}");
            return;
        }
    };

    let mut publisher = match RatingEventPublisher::connect_from_config(&config).await {
        Ok(publisher) => publisher,
        Err(e) => {
            warn!("could not connect to RabbitMQ: {e}");
            return;
        }
    };

    if let Err(e) = publisher.publish_batch_processed(summary, None).await {
        warn!("failed to publish batch-processed event: {e}");
    }
    if let Err(e) = publisher.close().await {
        warn!("failed to close RabbitMQ connection: {e}");
    }
}

fn init_tracing(log_level: &str) {
    let indicatif_layer = IndicatifLayer::new();
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();
}
