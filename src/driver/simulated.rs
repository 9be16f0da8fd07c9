//! In-process stand-in for a real meter driver, used for dry runs and tests.

use super::{ConnectionOptions, DriverError, MeterDriver, Target};
use crate::process::RawTable;
use crate::schema::{DataClass, ValueType};
use chrono::{Duration as ChronoDuration, Utc};
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
    time::Duration,
};
use tracing::debug;

const MAX_SIMULATED_ROWS: u32 = 96;

/// Scripted behaviour for one meter address.
#[derive(Clone, Debug)]
pub enum Script {
    /// `connect` fails with this reason.
    Refuse(String),
    /// `read` fails with a device status.
    DeviceFault { code: i32, message: String },
    /// `read` returns this table verbatim, whatever register code was asked for.
    Table(RawTable),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub connects: usize,
    pub closes: usize,
    pub open: usize,
    pub peak_open: usize,
}

pub struct SimSession {
    address: String,
    rows: u32,
}

/// Answers every read with a synthetic table built from the data-class catalogue,
/// unless a [`Script`] for the address says otherwise.
#[derive(Default)]
pub struct SimulatedDriver {
    scripts: HashMap<String, Script>,
    latency: Duration,
    connects: AtomicUsize,
    closes: AtomicUsize,
    open: AtomicUsize,
    peak_open: AtomicUsize,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, address: impl Into<String>, script: Script) -> Self {
        self.scripts.insert(address.into(), script);
        self
    }

    /// Block each `read` for `latency`, like a slow meter link.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn stats(&self) -> DriverStats {
        DriverStats {
            connects: self.connects.load(Ordering::SeqCst),
            closes: self.closes.load(Ordering::SeqCst),
            open: self.open.load(Ordering::SeqCst),
            peak_open: self.peak_open.load(Ordering::SeqCst),
        }
    }
}

impl MeterDriver for SimulatedDriver {
    type Session = SimSession;

    fn connect(
        &self,
        target: &Target,
        options: &ConnectionOptions,
    ) -> Result<SimSession, DriverError> {
        if let Some(Script::Refuse(reason)) = self.scripts.get(&target.address) {
            return Err(DriverError::Connection(reason.clone()));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        let now_open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_open.fetch_max(now_open, Ordering::SeqCst);
        debug!(address = %target.address, port = target.port, "simulated session opened");
        Ok(SimSession {
            address: target.address.clone(),
            rows: options.max_entries.clamp(1, MAX_SIMULATED_ROWS),
        })
    }

    fn read(&self, session: &mut SimSession, register_code: &str) -> Result<RawTable, DriverError> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        match self.scripts.get(&session.address) {
            Some(Script::DeviceFault { code, message }) => Err(DriverError::Device {
                code: *code,
                message: message.clone(),
            }),
            Some(Script::Table(table)) => Ok(table.clone()),
            _ => Ok(synthesize(&session.address, session.rows, register_code)),
        }
    }

    fn close(&self, _session: SimSession) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Deterministic table for `register_code`. Known profile codes get one column per
/// schema field; anything else gets a single column named after the code.
fn synthesize(address: &str, rows: u32, register_code: &str) -> RawTable {
    let seed = address.bytes().map(u64::from).sum::<u64>();
    let columns: Vec<(String, ValueType)> = match DataClass::from_register_code(register_code) {
        Some(class) => class
            .schema()
            .iter()
            .map(|f| (f.register_code.to_string(), f.value_type))
            .collect(),
        None => vec![(register_code.to_string(), ValueType::Decimal)],
    };

    let start = Utc::now() - ChronoDuration::minutes(15 * i64::from(rows));
    let data: Vec<Vec<String>> = (0..rows)
        .map(|r| {
            columns
                .iter()
                .enumerate()
                .map(|(c, (_, ty))| {
                    let n = seed + u64::from(r) * 7 + c as u64;
                    match ty {
                        ValueType::Text => (start + ChronoDuration::minutes(15 * i64::from(r)))
                            .format("%Y-%m-%d %H:%M:%S")
                            .to_string(),
                        ValueType::Decimal => format!("{:.2}", n as f64 * 1.25),
                        ValueType::SmallUnsigned => (n % 256).to_string(),
                        ValueType::U16 => (n % 65_536).to_string(),
                        ValueType::U32 | ValueType::Integer => n.to_string(),
                    }
                })
                .collect()
        })
        .collect();

    RawTable::new(columns.into_iter().map(|(label, _)| label).collect(), data)
}
