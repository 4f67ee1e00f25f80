//! Extension records attached to diagram elements
//!
//! Every element may carry a `MetadataBlock`: an ordered list of records,
//! each tagged with a `$type`. Records this crate understands are decoded
//! into typed variants; everything else is kept verbatim so that a
//! round trip never loses data written by other tools.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `$type` tag of the task metrics record
pub const TASK_METRICS_TYPE: &str = "custom:TaskMetrics";

/// Ordered collection of extension records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataBlock {
    #[serde(default)]
    pub values: Vec<ExtensionRecord>,
}

impl MetadataBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// First task metrics record, if any
    pub fn task_metrics(&self) -> Option<&TaskMetrics> {
        self.values.iter().find_map(|record| match record {
            ExtensionRecord::TaskMetrics(metrics) => Some(metrics),
            ExtensionRecord::Other(_) => None,
        })
    }

    /// Edit the task metrics record in place
    ///
    /// The first existing record is edited. Without one, a new empty record
    /// is edited and appended after the other records.
    pub fn update_task_metrics<R>(&mut self, edit: impl FnOnce(&mut TaskMetrics) -> R) -> R {
        if let Some(metrics) = self.values.iter_mut().find_map(|record| match record {
            ExtensionRecord::TaskMetrics(metrics) => Some(metrics),
            ExtensionRecord::Other(_) => None,
        }) {
            return edit(metrics);
        }

        let mut metrics = TaskMetrics::default();
        let result = edit(&mut metrics);
        self.values.push(ExtensionRecord::TaskMetrics(metrics));
        result
    }

    /// Number of records carrying the given `$type`
    pub fn count_of_type(&self, record_type: &str) -> usize {
        self.values
            .iter()
            .filter(|record| record.record_type() == record_type)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A single typed extension record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRecord", into = "RawRecord")]
pub enum ExtensionRecord {
    TaskMetrics(TaskMetrics),
    /// A record of a type this crate does not interpret
    Other(RawRecord),
}

impl ExtensionRecord {
    pub fn record_type(&self) -> &str {
        match self {
            Self::TaskMetrics(_) => TASK_METRICS_TYPE,
            Self::Other(raw) => &raw.record_type,
        }
    }
}

/// Wire form of an extension record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl RawRecord {
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            properties: Map::new(),
        }
    }

    /// Set a property on the record
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

impl From<RawRecord> for ExtensionRecord {
    fn from(raw: RawRecord) -> Self {
        if raw.record_type == TASK_METRICS_TYPE {
            Self::TaskMetrics(TaskMetrics::from_properties(&raw.properties))
        } else {
            Self::Other(raw)
        }
    }
}

impl From<ExtensionRecord> for RawRecord {
    fn from(record: ExtensionRecord) -> Self {
        match record {
            ExtensionRecord::TaskMetrics(metrics) => RawRecord {
                record_type: TASK_METRICS_TYPE.to_string(),
                properties: metrics.into_properties(),
            },
            ExtensionRecord::Other(raw) => raw,
        }
    }
}

/// Timing and capacity attributes of a task
///
/// Older diagrams only carry `duration`; the remaining fields are optional
/// and unknown fields are dropped when the record is decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskMetrics {
    /// "HH:MM" or empty
    pub duration: String,
    pub sla: Option<String>,
    pub capacity: Option<u32>,
    pub bottleneck: Option<bool>,
}

impl TaskMetrics {
    pub fn with_duration(duration: impl Into<String>) -> Self {
        Self {
            duration: duration.into(),
            ..Self::default()
        }
    }

    fn from_properties(properties: &Map<String, Value>) -> Self {
        let duration = match properties.get("duration") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        Self {
            duration,
            sla: properties
                .get("sla")
                .and_then(Value::as_str)
                .map(str::to_string),
            capacity: properties
                .get("capacity")
                .and_then(Value::as_u64)
                .and_then(|c| u32::try_from(c).ok()),
            bottleneck: properties.get("bottleneck").and_then(Value::as_bool),
        }
    }

    fn into_properties(self) -> Map<String, Value> {
        let mut properties = Map::new();
        properties.insert("duration".to_string(), Value::String(self.duration));
        if let Some(sla) = self.sla {
            properties.insert("sla".to_string(), Value::String(sla));
        }
        if let Some(capacity) = self.capacity {
            properties.insert("capacity".to_string(), Value::from(capacity));
        }
        if let Some(bottleneck) = self.bottleneck {
            properties.insert("bottleneck".to_string(), Value::Bool(bottleneck));
        }
        properties
    }
}
