pub mod config;
pub mod publisher;

pub use config::RabbitMqConfig;
pub use publisher::{BatchProcessedMessage, PublisherError, RatingEventPublisher};
