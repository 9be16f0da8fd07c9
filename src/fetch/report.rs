use crate::driver::TargetId;
use crate::error::{GatewayError, Result};
use crate::process::Record;
use crate::schema::DataClass;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// A successful per-meter result, emitted to the sink as soon as it is ready.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub target: TargetId,
    pub data_class: DataClass,
    pub records: Vec<Record>,
    pub read_at: DateTime<Utc>,
}

/// Terminal outcome of one target's task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A reading with this many records reached the sink.
    Delivered { records: usize },
    Failed(GatewayError),
}

impl Outcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered { .. })
    }

    pub fn error(&self) -> Option<&GatewayError> {
        match self {
            Outcome::Failed(e) => Some(e),
            Outcome::Delivered { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub data_class: DataClass,
    pub targets: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

/// Per-target outcomes of one batch, in request order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    data_class: DataClass,
    outcomes: Vec<(TargetId, Outcome)>,
    elapsed: Duration,
}

impl BatchReport {
    pub(crate) fn new(
        data_class: DataClass,
        outcomes: Vec<(TargetId, Outcome)>,
        elapsed: Duration,
    ) -> Self {
        Self {
            data_class,
            outcomes,
            elapsed,
        }
    }

    pub fn data_class(&self) -> DataClass {
        self.data_class
    }

    pub fn outcomes(&self) -> &[(TargetId, Outcome)] {
        &self.outcomes
    }

    pub fn get(&self, target: &TargetId) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == target)
            .map(|(_, o)| o)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&TargetId, &GatewayError)> {
        self.outcomes
            .iter()
            .filter_map(|(id, o)| o.error().map(|e| (id, e)))
    }

    /// Representative batch error: the first failure in request order.
    pub fn error(&self) -> Option<&GatewayError> {
        self.failures().next().map(|(_, e)| e)
    }

    /// `Err` with the representative error if any target failed.
    pub fn into_result(self) -> Result<Self> {
        match self.error() {
            Some(e) => Err(e.clone()),
            None => Ok(self),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_delivered()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            data_class: self.data_class,
            targets: self.len(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            elapsed_ms: self.elapsed.as_millis() as u64,
        }
    }
}

/// Items of a batch stream. Readings arrive first-ready-first-served; a batch that
/// had failures yields one `Failed`, and every stream ends with `Completed`.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchMessage {
    Reading(Reading),
    Failed(GatewayError),
    Completed(BatchSummary),
}

impl From<Reading> for BatchMessage {
    fn from(reading: Reading) -> Self {
        BatchMessage::Reading(reading)
    }
}
