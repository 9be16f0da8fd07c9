//! Meter-reading gateway.
//!
//! A batch names a data class and a list of meters. [`fetch::Gateway`] reads that
//! class from every meter in parallel through a [`driver::MeterDriver`], maps each
//! returned [`process::RawTable`] onto the class schema, and hands results to the
//! caller as they complete.

pub mod config;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod process;
pub mod schema;

pub use config::GatewayConfig;
pub use driver::{ConnectionOptions, Credentials, MeterDriver, Target, TargetId};
pub use error::{ErrorKind, GatewayError};
pub use fetch::{BatchMessage, BatchReport, BatchRequest, Gateway, Reading};
pub use process::{map_table, RawTable, Record};
pub use schema::{DataClass, FieldSpec, Value, ValueType};
