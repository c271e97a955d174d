use std::sync::Arc;

use chrono::{DateTime, Utc};
use lapin::{
    options::{BasicPublishOptions, ExchangeDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{messaging::config::RabbitMqConfig, model::aggregator::BatchSummary};

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("Failed to connect to RabbitMQ: {0}")]
    Connection(#[from] lapin::Error),

    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Publisher not connected")]
    NotConnected
}

/// Event emitted after a rating batch has been applied and persisted.
/// Consumers (dashboards, stats collectors) use it as a refresh signal.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProcessedMessage {
    pub applied_entries: usize,
    pub discarded_entries: usize,
    pub total_sum_number: usize,
    pub total_rated_item_number: usize,
    pub processed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>
}

impl BatchProcessedMessage {
    pub fn from_summary(summary: &BatchSummary, correlation_id: Option<String>) -> Self {
        BatchProcessedMessage {
            applied_entries: summary.applied,
            discarded_entries: summary.discarded_total(),
            total_sum_number: summary.total_stats.total_sum_number,
            total_rated_item_number: summary.total_stats.total_rated_item_number,
            processed_at: Utc::now(),
            correlation_id
        }
    }
}

/// Publishes batch-processed events to a durable fanout exchange.
pub struct RatingEventPublisher {
    connection: Option<Arc<Connection>>,
    channel: Option<Channel>,
    exchange: String,
    routing_key: String
}

impl RatingEventPublisher {
    pub fn new(exchange: String, routing_key: String) -> Self {
        Self {
            connection: None,
            channel: None,
            exchange,
            routing_key
        }
    }

    pub fn from_config(config: &RabbitMqConfig) -> Self {
        Self::new(config.exchange.clone(), config.routing_key.clone())
    }

    /// Creates and connects a publisher in one step.
    pub async fn connect_from_config(config: &RabbitMqConfig) -> Result<Self, PublisherError> {
        let mut publisher = Self::from_config(config);
        publisher.connect(&config.connection_url()).await?;
        Ok(publisher)
    }

    /// Connects and declares the fanout exchange.
    pub async fn connect(&mut self, url: &str) -> Result<(), PublisherError> {
        let connection = Arc::new(Connection::connect(url, ConnectionProperties::default()).await?);
        let channel = connection.create_channel().await?;

        channel
            .exchange_declare(
                &self.exchange,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default()
            )
            .await?;

        self.connection = Some(connection);
        self.channel = Some(channel);

        info!(exchange = %self.exchange, routing_key = %self.routing_key, "connected to RabbitMQ");
        Ok(())
    }

    /// Publishes one batch-processed event. Store persistence has already
    /// happened by the time this runs; a publish failure is the caller's to
    /// log, never a reason to roll anything back.
    pub async fn publish_batch_processed(
        &self,
        summary: &BatchSummary,
        correlation_id: Option<String>
    ) -> Result<(), PublisherError> {
        let channel = self.channel.as_ref().ok_or(PublisherError::NotConnected)?;

        let message = BatchProcessedMessage::from_summary(summary, correlation_id);
        let payload = serde_json::to_vec(&message)?;
        let message_id = Uuid::new_v4().to_string();

        channel
            .basic_publish(
                &self.exchange,
                &self.routing_key,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_message_id(message_id.clone().into())
                    .with_timestamp(Utc::now().timestamp() as u64)
            )
            .await?;

        debug!(
            message_id = %message_id,
            applied = message.applied_entries,
            discarded = message.discarded_entries,
            "published batch-processed event"
        );

        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some() && self.channel.is_some()
    }

    pub async fn close(&mut self) -> Result<(), PublisherError> {
        if let Some(channel) = self.channel.take() {
            channel.close(200, "Normal shutdown").await?;
        }

        if let Some(connection) = self.connection.take() {
            if let Ok(connection) = Arc::try_unwrap(connection) {
                connection.close(200, "Normal shutdown").await?;
            }
        }

        info!("RabbitMQ connection closed");
        Ok(())
    }
}

impl Drop for RatingEventPublisher {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("rating event publisher dropped without proper closure");
        }
    }
}
