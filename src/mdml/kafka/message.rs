use crate::mdml::kafka::headers::Headers;

/// A record ready to be published: optional key, required value
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
    pub headers: Headers,
    /// Milliseconds since the Unix epoch; the broker assigns one when absent
    pub timestamp: Option<i64>,
}

impl OutgoingMessage {
    /// Creates a keyless message with the given value
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: None,
            value: value.into(),
            headers: Headers::new(),
            timestamp: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Where the broker stored a produced message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// A raw record received from a subscription, detached from the client that fetched it
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
    pub headers: Headers,
    pub timestamp: Option<i64>,
}

/// A consumed record whose value has been decoded into `V`
///
/// The consumer flows hand one of these to the per-message handler together with
/// the topic and partition it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Message<V> {
    pub key: Option<Vec<u8>>,
    pub value: V,
    pub headers: Headers,
    pub offset: i64,
    pub timestamp: Option<i64>,
}

impl<V> Message<V> {
    /// Builds a decoded message from the raw record it was decoded from
    pub fn from_record(record: ConsumedRecord, value: V) -> Self {
        Self {
            key: record.key,
            value,
            headers: record.headers,
            offset: record.offset,
            timestamp: record.timestamp,
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the key as UTF-8 text when it is valid UTF-8
    pub fn key_str(&self) -> Option<&str> {
        self.key
            .as_deref()
            .and_then(|k| std::str::from_utf8(k).ok())
    }

    pub fn into_value(self) -> V {
        self.value
    }
}
