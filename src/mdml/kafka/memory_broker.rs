//! In-process broker
//!
//! Suitable for tests and for running the flows without a cluster. Every topic has a
//! single partition (0); consumer groups share a read position per topic, and all data
//! is lost when the last handle is dropped.

use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

use crate::mdml::kafka::broker::{BrokerConsumer, BrokerProducer};
use crate::mdml::kafka::common_config::OffsetReset;
use crate::mdml::kafka::kafka_error::KafkaClientError;
use crate::mdml::kafka::message::{ConsumedRecord, DeliveryReport, OutgoingMessage};
use crate::mdml::kafka::utils::now_millis;

const MEMORY_BROKERS: &str = "memory";
const PARTITION: i32 = 0;

struct BrokerState {
    topics: Mutex<HashMap<String, Vec<ConsumedRecord>>>,
    // (group, topic) -> next offset to deliver
    group_offsets: Mutex<HashMap<(String, String), usize>>,
    reachable: AtomicBool,
    open_connections: AtomicUsize,
    arrivals: Notify,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a shared in-memory broker; clones refer to the same broker
#[derive(Clone)]
pub struct MemoryBroker {
    inner: Arc<BrokerState>,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BrokerState {
                topics: Mutex::new(HashMap::new()),
                group_offsets: Mutex::new(HashMap::new()),
                reachable: AtomicBool::new(true),
                open_connections: AtomicUsize::new(0),
                arrivals: Notify::new(),
            }),
        }
    }

    /// Simulates the broker going down (`false`) or coming back (`true`)
    ///
    /// While unreachable, `connect` and `send` fail.
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.reachable.store(reachable, Ordering::SeqCst);
    }

    fn is_reachable(&self) -> bool {
        self.inner.reachable.load(Ordering::SeqCst)
    }

    /// Number of producer and consumer handles currently connected
    pub fn open_connections(&self) -> usize {
        self.inner.open_connections.load(Ordering::SeqCst)
    }

    pub fn producer(&self) -> MemoryProducer {
        MemoryProducer {
            broker: self.clone(),
            connected: false,
        }
    }

    pub fn consumer(
        &self,
        group_id: impl Into<String>,
        offset_reset: OffsetReset,
    ) -> MemoryConsumer {
        MemoryConsumer {
            broker: self.clone(),
            group_id: group_id.into(),
            offset_reset,
            connected: false,
            subscriptions: Vec::new(),
        }
    }

    /// Appends a message directly, bypassing any producer handle
    pub fn publish(&self, topic: &str, message: OutgoingMessage) -> DeliveryReport {
        let offset = {
            let mut topics = lock(&self.inner.topics);
            let log = topics.entry(topic.to_string()).or_default();
            let offset = log.len() as i64;
            log.push(ConsumedRecord {
                topic: topic.to_string(),
                partition: PARTITION,
                offset,
                key: message.key,
                value: message.value,
                headers: message.headers,
                timestamp: Some(message.timestamp.unwrap_or_else(now_millis)),
            });
            offset
        };
        self.inner.arrivals.notify_waiters();
        debug!("Memory broker appended {}[{}]@{}", topic, PARTITION, offset);
        DeliveryReport {
            topic: topic.to_string(),
            partition: PARTITION,
            offset,
        }
    }

    /// Snapshot of every record stored for `topic`
    pub fn messages(&self, topic: &str) -> Vec<ConsumedRecord> {
        lock(&self.inner.topics)
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    fn acquire(&self) -> Result<(), KafkaClientError> {
        if !self.is_reachable() {
            return Err(KafkaClientError::Unreachable {
                brokers: MEMORY_BROKERS.to_string(),
                reason: "broker is down".to_string(),
            });
        }
        self.inner.open_connections.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) {
        self.inner.open_connections.fetch_sub(1, Ordering::SeqCst);
    }

    fn join(&self, group_id: &str, topic: &str, offset_reset: OffsetReset) {
        let end = lock(&self.inner.topics)
            .entry(topic.to_string())
            .or_default()
            .len();
        lock(&self.inner.group_offsets)
            .entry((group_id.to_string(), topic.to_string()))
            .or_insert(match offset_reset {
                OffsetReset::Earliest => 0,
                OffsetReset::Latest => end,
            });
    }

    fn take_next(&self, group_id: &str, topics: &[String]) -> Option<ConsumedRecord> {
        let stored = lock(&self.inner.topics);
        let mut offsets = lock(&self.inner.group_offsets);
        for topic in topics {
            let position = offsets
                .entry((group_id.to_string(), topic.clone()))
                .or_insert(0);
            if let Some(record) = stored.get(topic).and_then(|log| log.get(*position)) {
                *position += 1;
                return Some(record.clone());
            }
        }
        None
    }
}

pub struct MemoryProducer {
    broker: MemoryBroker,
    connected: bool,
}

#[async_trait]
impl BrokerProducer for MemoryProducer {
    async fn connect(&mut self) -> Result<(), KafkaClientError> {
        if !self.connected {
            self.broker.acquire()?;
            self.connected = true;
        }
        Ok(())
    }

    async fn send(
        &mut self,
        topic: &str,
        messages: Vec<OutgoingMessage>,
    ) -> Result<Vec<DeliveryReport>, KafkaClientError> {
        if !self.connected {
            return Err(KafkaClientError::NotConnected);
        }
        if !self.broker.is_reachable() {
            return Err(KafkaClientError::Delivery {
                topic: topic.to_string(),
                reason: "broker is down".to_string(),
            });
        }
        Ok(messages
            .into_iter()
            .map(|message| self.broker.publish(topic, message))
            .collect())
    }

    async fn disconnect(&mut self) -> Result<(), KafkaClientError> {
        if self.connected {
            self.connected = false;
            self.broker.release();
        }
        Ok(())
    }
}

pub struct MemoryConsumer {
    broker: MemoryBroker,
    group_id: String,
    offset_reset: OffsetReset,
    connected: bool,
    subscriptions: Vec<String>,
}

#[async_trait]
impl BrokerConsumer for MemoryConsumer {
    async fn connect(&mut self) -> Result<(), KafkaClientError> {
        if !self.connected {
            self.broker.acquire()?;
            self.connected = true;
        }
        Ok(())
    }

    async fn subscribe(&mut self, topics: &[String]) -> Result<(), KafkaClientError> {
        if !self.connected {
            return Err(KafkaClientError::NotConnected);
        }
        for topic in topics {
            self.broker.join(&self.group_id, topic, self.offset_reset);
        }
        self.subscriptions = topics.to_vec();
        Ok(())
    }

    async fn next_record(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<ConsumedRecord>, KafkaClientError> {
        if !self.connected {
            return Err(KafkaClientError::NotConnected);
        }
        let deadline = timeout.map(|limit| tokio::time::Instant::now() + limit);
        let state = Arc::clone(&self.broker.inner);

        loop {
            // registered before checking so an append in between is not missed
            let arrival = state.arrivals.notified();
            if let Some(record) = self.broker.take_next(&self.group_id, &self.subscriptions) {
                return Ok(Some(record));
            }
            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, arrival).await.is_err() {
                        return Ok(None);
                    }
                }
                None => arrival.await,
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), KafkaClientError> {
        if self.connected {
            self.connected = false;
            self.subscriptions.clear();
            self.broker.release();
        }
        Ok(())
    }
}
