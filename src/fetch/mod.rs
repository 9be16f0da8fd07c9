//! Fan-out of one batch request over many meters.
//!
//! Every target gets its own task. Tasks wait on a shared pool semaphore, run the
//! blocking driver calls on the blocking thread pool, and push their reading into
//! the caller's sink the moment it is ready. The batch call returns once every task
//! has reached a terminal outcome.

pub mod report;
pub mod task;

pub use report::{BatchMessage, BatchReport, BatchSummary, Outcome, Reading};
pub use task::read_meter;

use crate::config::GatewayConfig;
use crate::driver::{ConnectionOptions, MeterDriver, Target};
use crate::error::{GatewayError, Result};
use crate::schema::DataClass;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, Semaphore},
    time::Instant,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, instrument};

use task::{run_meter, MeterJob};

/// Stream of [`BatchMessage`]s for one batch.
pub type BatchStream = ReceiverStream<BatchMessage>;

/// Read one data class from a set of meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub data_class: DataClass,
    pub targets: Vec<Target>,
    /// Falls back to the gateway's configured defaults when absent.
    #[serde(default)]
    pub options: Option<ConnectionOptions>,
}

impl BatchRequest {
    pub fn new(data_class: DataClass, targets: Vec<Target>) -> Self {
        Self {
            data_class,
            targets,
            options: None,
        }
    }

    pub fn with_options(mut self, options: ConnectionOptions) -> Self {
        self.options = Some(options);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(GatewayError::InvalidArgument("no meters provided".into()));
        }
        Ok(())
    }
}

/// Batch orchestrator over a shared driver and a bounded pool of driver sessions.
pub struct Gateway<D> {
    driver: Arc<D>,
    limiter: Arc<Semaphore>,
    config: GatewayConfig,
}

impl<D> Clone for Gateway<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            limiter: Arc::clone(&self.limiter),
            config: self.config.clone(),
        }
    }
}

impl<D: MeterDriver> Gateway<D> {
    pub fn new(driver: D, config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            driver: Arc::new(driver),
            limiter: Arc::new(Semaphore::new(config.max_concurrency)),
            config,
        })
    }

    /// Gateway with the default configuration.
    pub fn with_driver(driver: D) -> Self {
        let config = GatewayConfig::default();
        Self {
            driver: Arc::new(driver),
            limiter: Arc::new(Semaphore::new(config.max_concurrency)),
            config,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Fan `request` out over its targets, emitting each reading into `sink` as it
    /// completes, and wait for every target to finish.
    ///
    /// Fails only for an invalid request, before anything is started. Per-target
    /// failures are in the returned report; [`BatchReport::error`] gives the
    /// representative one.
    ///
    /// Tasks wait on `sink` when it is full, so the receiver must be drained while
    /// this runs. A bounded sink smaller than the number of successes that nobody
    /// reads never joins. Use [`stream_batch`](Self::stream_batch) to have the
    /// gateway own the channel.
    #[instrument(
        level = "info",
        skip(self, request, sink),
        fields(class = %request.data_class, targets = request.targets.len())
    )]
    pub async fn run_batch<T>(
        &self,
        request: BatchRequest,
        sink: mpsc::Sender<T>,
    ) -> Result<BatchReport>
    where
        T: From<Reading> + Send + 'static,
    {
        request.validate()?;
        let BatchRequest {
            data_class,
            targets,
            options,
        } = request;
        let options = Arc::new(options.unwrap_or_else(|| self.config.connection.clone()));

        let start = Instant::now();
        info!(
            register = data_class.register_code(),
            pool = self.config.max_concurrency,
            "starting batch"
        );

        let mut ids = Vec::with_capacity(targets.len());
        let mut handles = Vec::with_capacity(targets.len());
        for target in targets {
            ids.push(target.id());
            let job = MeterJob {
                driver: Arc::clone(&self.driver),
                limiter: Arc::clone(&self.limiter),
                target,
                class: data_class,
                options: Arc::clone(&options),
            };
            handles.push(tokio::spawn(run_meter(job, sink.clone())));
        }
        // only the tasks hold senders now
        drop(sink);

        let outcomes = ids
            .into_iter()
            .zip(join_all(handles).await)
            .map(|(id, joined)| {
                let outcome = joined.unwrap_or_else(|e| {
                    error!(meter = %id, error = %e, "meter task aborted");
                    Outcome::Failed(GatewayError::TaskAborted { target: id.clone() })
                });
                (id, outcome)
            })
            .collect();

        let report = BatchReport::new(data_class, outcomes, start.elapsed());
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            elapsed = ?report.elapsed(),
            "batch finished"
        );
        Ok(report)
    }

    /// Like [`run_batch`](Self::run_batch), but delivers everything as one stream.
    ///
    /// An invalid request fails here, synchronously, and nothing is spawned. Otherwise
    /// the stream yields readings as they arrive, then `Failed` with the
    /// representative error if any target failed, then `Completed`.
    ///
    /// The batch runs on a spawned task, so this must be called from inside a tokio
    /// runtime. It panics otherwise.
    pub fn stream_batch(&self, request: BatchRequest) -> Result<BatchStream> {
        request.validate()?;
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let gateway = self.clone();

        tokio::spawn(async move {
            let tail = match gateway.run_batch(request, tx.clone()).await {
                Ok(report) => {
                    let mut tail = Vec::with_capacity(2);
                    if let Some(err) = report.error() {
                        tail.push(BatchMessage::Failed(err.clone()));
                    }
                    tail.push(BatchMessage::Completed(report.summary()));
                    tail
                }
                Err(err) => vec![BatchMessage::Failed(err)],
            };
            for msg in tail {
                if tx.send(msg).await.is_err() {
                    break;
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Script, SimulatedDriver};
    use crate::error::ErrorKind;
    use crate::process::RawTable;
    use crate::schema::Value;
    use std::{collections::HashSet, time::Duration};
    use tokio_stream::StreamExt;
    use tracing_subscriber::{fmt, EnvFilter};

    fn init_logging() {
        let _ = fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_target(false)
            .with_test_writer()
            .try_init();
    }

    fn targets(addrs: &[&str]) -> Vec<Target> {
        addrs.iter().map(|a| Target::new(*a, 4059)).collect()
    }

    async fn drain(mut rx: mpsc::Receiver<Reading>) -> Vec<Reading> {
        let mut out = Vec::new();
        while let Some(r) = rx.recv().await {
            out.push(r);
        }
        out
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_before_any_work() {
        let gateway = Gateway::with_driver(SimulatedDriver::new());
        let (tx, rx) = mpsc::channel::<Reading>(8);

        let err = gateway
            .run_batch(BatchRequest::new(DataClass::SingleRegister, vec![]), tx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(drain(rx).await.is_empty());
        assert_eq!(gateway.driver().stats().connects, 0);

        let streamed = gateway.stream_batch(BatchRequest::new(DataClass::SingleRegister, vec![]));
        assert!(matches!(streamed, Err(GatewayError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn two_succeed_one_refuses() {
        init_logging();
        let driver = SimulatedDriver::new().script("c", Script::Refuse("connection timed out".into()));
        let gateway = Gateway::with_driver(driver);
        let (tx, rx) = mpsc::channel(8);
        let collector = tokio::spawn(drain(rx));

        let report = gateway
            .run_batch(
                BatchRequest::new(DataClass::SingleRegister, targets(&["a", "b", "c"])),
                tx,
            )
            .await
            .unwrap();
        let readings = collector.await.unwrap();

        let got: HashSet<_> = readings.iter().map(|r| r.target.as_str().to_string()).collect();
        assert_eq!(got, HashSet::from(["a:4059".to_string(), "b:4059".to_string()]));
        assert_eq!(report.len(), 3);
        let err = report.error().unwrap();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.target().map(|t| t.as_str()), Some("c:4059"));
    }

    #[tokio::test]
    async fn one_outcome_per_target_and_error_iff_any_failed() {
        let cases: Vec<(Vec<&str>, bool)> = vec![
            (vec!["ok1"], false),
            (vec!["ok1", "ok2", "ok3", "ok4"], false),
            (vec!["bad"], true),
            (vec!["ok1", "fault", "ok2", "bad", "ok3"], true),
        ];
        for (addrs, expect_err) in cases {
            let driver = SimulatedDriver::new()
                .script("bad", Script::Refuse("refused".into()))
                .script(
                    "fault",
                    Script::DeviceFault {
                        code: 1,
                        message: "hardware fault".into(),
                    },
                )
                .with_latency(Duration::from_millis(5));
            let gateway = Gateway::with_driver(driver);
            let (tx, rx) = mpsc::channel(16);
            let collector = tokio::spawn(drain(rx));

            let report = tokio::time::timeout(
                Duration::from_secs(10),
                gateway.run_batch(BatchRequest::new(DataClass::BlockLoadProfile, targets(&addrs)), tx),
            )
            .await
            .expect("batch should join")
            .unwrap();
            let readings = collector.await.unwrap();

            assert_eq!(report.len(), addrs.len());
            assert_eq!(readings.len() + report.failed(), addrs.len());
            assert_eq!(readings.len(), report.succeeded());
            assert_eq!(report.error().is_some(), expect_err);
            let stats = gateway.driver().stats();
            assert_eq!(stats.connects, stats.closes);
        }
    }

    #[tokio::test]
    async fn pool_ceiling_is_respected() {
        let driver = SimulatedDriver::new().with_latency(Duration::from_millis(20));
        let config = GatewayConfig {
            max_concurrency: 3,
            ..Default::default()
        };
        let gateway = Gateway::new(driver, config).unwrap();
        let addrs: Vec<String> = (0..12).map(|i| format!("10.0.0.{}", i)).collect();
        let request = BatchRequest::new(
            DataClass::DailyLoadProfile,
            addrs.iter().map(|a| Target::new(a.clone(), 4059)).collect(),
        );
        let (tx, rx) = mpsc::channel(16);
        let collector = tokio::spawn(drain(rx));

        let report = gateway.run_batch(request, tx).await.unwrap();
        assert_eq!(collector.await.unwrap().len(), 12);
        assert!(report.error().is_none());

        let stats = gateway.driver().stats();
        assert!(stats.peak_open <= 3, "peak {}", stats.peak_open);
        assert_eq!(stats.connects, 12);
        assert_eq!(stats.open, 0);
    }

    #[tokio::test]
    async fn zero_ceiling_is_invalid() {
        let config = GatewayConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        let err = Gateway::new(SimulatedDriver::new(), config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn small_sink_joins_when_drained_concurrently() {
        let gateway = Gateway::with_driver(SimulatedDriver::new());
        let (tx, rx) = mpsc::channel::<Reading>(1);
        let collector = tokio::spawn(drain(rx));

        let report = tokio::time::timeout(
            Duration::from_secs(10),
            gateway.run_batch(
                BatchRequest::new(
                    DataClass::SingleRegister,
                    targets(&["a", "b", "c", "d", "e", "f"]),
                ),
                tx,
            ),
        )
        .await
        .expect("batch should join")
        .unwrap();

        assert_eq!(report.succeeded(), 6);
        assert_eq!(collector.await.unwrap().len(), 6);
    }

    #[test]
    #[should_panic]
    fn stream_batch_needs_a_runtime() {
        let gateway = Gateway::with_driver(SimulatedDriver::new());
        let _ = gateway.stream_batch(BatchRequest::new(DataClass::SingleRegister, targets(&["a"])));
    }

    #[tokio::test]
    async fn scripted_table_is_mapped_into_the_reading() {
        let table = RawTable::new(
            vec!["1.0.1.8.0.255".into(), "1.0.12.27.0.255".into()],
            vec![vec!["1250.75".into(), "230.5".into()]],
        );
        let gateway = Gateway::with_driver(SimulatedDriver::new().script("m1", Script::Table(table)));
        let (tx, mut rx) = mpsc::channel::<Reading>(1);

        let report = gateway
            .run_batch(BatchRequest::new(DataClass::BlockLoadProfile, targets(&["m1"])), tx)
            .await
            .unwrap();
        let reading = rx.recv().await.unwrap();

        assert!(report.error().is_none());
        assert_eq!(reading.records.len(), 1);
        let record = &reading.records[0];
        assert_eq!(record.get("AverageVoltage"), Some(&Value::Decimal(230.5)));
        assert_eq!(record.get("BlockEnergyWhImport"), Some(&Value::Decimal(0.0)));
    }

    #[tokio::test]
    async fn stream_ends_with_failure_then_completion() {
        let driver = SimulatedDriver::new().script(
            "f",
            Script::DeviceFault {
                code: 13,
                message: "access denied".into(),
            },
        );
        let gateway = Gateway::with_driver(driver);
        let stream = gateway
            .stream_batch(BatchRequest::new(
                DataClass::InstantaneousProfile,
                targets(&["a", "f", "b"]),
            ))
            .unwrap();
        let messages: Vec<BatchMessage> = stream.collect().await;

        assert_eq!(messages.len(), 4);
        assert!(messages[..2]
            .iter()
            .all(|m| matches!(m, BatchMessage::Reading(_))));
        match &messages[2] {
            BatchMessage::Failed(GatewayError::Device { code, target, .. }) => {
                assert_eq!(*code, 13);
                assert_eq!(target.as_str(), "f:4059");
            }
            other => panic!("unexpected {:?}", other),
        }
        match &messages[3] {
            BatchMessage::Completed(summary) => {
                assert_eq!(summary.targets, 3);
                assert_eq!(summary.succeeded, 2);
                assert_eq!(summary.failed, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn clean_stream_has_no_failure_message() {
        let gateway = Gateway::with_driver(SimulatedDriver::new());
        let messages: Vec<BatchMessage> = gateway
            .stream_batch(BatchRequest::new(DataClass::BillingProfile, targets(&["a"])))
            .unwrap()
            .collect()
            .await;
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages.last(), Some(BatchMessage::Completed(_))));
    }

    #[tokio::test]
    async fn request_options_override_config_defaults() {
        let gateway = Gateway::with_driver(SimulatedDriver::new());
        let (tx, mut rx) = mpsc::channel::<Reading>(1);
        let request = BatchRequest::new(DataClass::DailyLoadProfile, targets(&["a"])).with_options(
            ConnectionOptions {
                max_entries: 5,
                ..Default::default()
            },
        );
        gateway.run_batch(request, tx).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().records.len(), 5);
    }
}
