use rdkafka::message::Headers as KafkaHeaders;
use std::collections::HashMap;

/// Kafka message headers
///
/// Wraps a `HashMap<String, Option<String>>`; a `None` value is a null header.
///
/// ```rust
/// # use mdml_streams::Headers;
/// let headers = Headers::new()
///     .insert("source", "mdml-producer")
///     .insert_null("trace-id");
/// assert_eq!(headers.get("source"), Some("mdml-producer"));
/// assert!(headers.contains_key("trace-id"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Headers {
    inner: HashMap<String, Option<String>>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header with a value
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.insert(key.into(), Some(value.into()));
        self
    }

    /// Inserts a header with no value (null header)
    pub fn insert_null(mut self, key: impl Into<String>) -> Self {
        self.inner.insert(key.into(), None);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).and_then(|v| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<String>)> {
        self.inner.iter()
    }

    pub(crate) fn to_rdkafka_headers(&self) -> rdkafka::message::OwnedHeaders {
        let mut headers = rdkafka::message::OwnedHeaders::new_with_capacity(self.inner.len());
        for (key, value) in &self.inner {
            headers = headers.insert(rdkafka::message::Header {
                key,
                value: value.as_deref(),
            });
        }
        headers
    }

    pub(crate) fn from_rdkafka_headers<H: KafkaHeaders>(kafka_headers: &H) -> Self {
        let mut inner = HashMap::with_capacity(kafka_headers.count());
        for header in kafka_headers.iter() {
            // lossy: header values are opaque bytes on the wire
            let value = header
                .value
                .map(|v| String::from_utf8_lossy(v).into_owned());
            inner.insert(header.key.to_string(), value);
        }
        Self { inner }
    }
}
