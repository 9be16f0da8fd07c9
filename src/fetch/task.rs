use super::report::{Outcome, Reading};
use crate::driver::{ConnectionOptions, MeterDriver, SessionGuard, Target, TargetId};
use crate::error::{GatewayError, Result};
use crate::process::{map_table, Record};
use crate::schema::DataClass;
use chrono::Utc;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, Semaphore},
    task,
    time::Instant,
};
use tracing::{debug, info, warn};

/// Connect, read and map one meter, blocking the calling thread.
///
/// The session is closed on every path out of this function.
pub fn read_meter<D: MeterDriver>(
    driver: &D,
    target: &Target,
    class: DataClass,
    options: &ConnectionOptions,
) -> Result<Vec<Record>> {
    let id = target.id();
    let mut session = SessionGuard::open(driver, target, options)
        .map_err(|e| GatewayError::from_driver(&id, e))?;
    let table = session
        .read(class.register_code())
        .map_err(|e| GatewayError::from_driver(&id, e))?;
    debug!(meter = %id, rows = table.num_rows(), columns = table.num_columns(), "table read");

    let records = map_table(&table, class.schema()).map_err(|e| GatewayError::from_table(&id, e))?;
    session.close();
    Ok(records)
}

/// Everything one spawned meter task needs.
pub(crate) struct MeterJob<D> {
    pub driver: Arc<D>,
    pub limiter: Arc<Semaphore>,
    pub target: Target,
    pub class: DataClass,
    pub options: Arc<ConnectionOptions>,
}

/// Run one target to its terminal outcome: a reading in the sink, or an error.
pub(crate) async fn run_meter<D, T>(job: MeterJob<D>, sink: mpsc::Sender<T>) -> Outcome
where
    D: MeterDriver,
    T: From<Reading> + Send + 'static,
{
    let MeterJob {
        driver,
        limiter,
        target,
        class,
        options,
    } = job;
    let id = target.id();

    // pool slot, held only while the driver is busy
    let permit = match limiter.acquire_owned().await {
        Ok(p) => p,
        Err(_) => return Outcome::Failed(GatewayError::TaskAborted { target: id }),
    };

    let start = Instant::now();
    debug!(meter = %id, class = %class, "reading meter");
    let result = task::spawn_blocking(move || {
        read_meter(driver.as_ref(), &target, class, &options)
    })
    .await
    .unwrap_or_else(|e| {
        warn!(meter = %id, error = %e, "driver call did not complete");
        Err(GatewayError::TaskAborted { target: id.clone() })
    });
    drop(permit);

    match result {
        Ok(records) => deliver(id, class, records, start, &sink).await,
        Err(err) => {
            warn!(meter = %id, error = %err, elapsed = ?start.elapsed(), "meter read failed");
            Outcome::Failed(err)
        }
    }
}

async fn deliver<T: From<Reading>>(
    id: TargetId,
    class: DataClass,
    records: Vec<Record>,
    start: Instant,
    sink: &mpsc::Sender<T>,
) -> Outcome {
    let count = records.len();
    if count == 0 {
        warn!(meter = %id, class = %class, "meter returned no rows");
    }
    let reading = Reading {
        target: id.clone(),
        data_class: class,
        records,
        read_at: Utc::now(),
    };
    if sink.send(T::from(reading)).await.is_err() {
        warn!(meter = %id, "result sink closed; dropping reading");
        return Outcome::Failed(GatewayError::SinkClosed { target: id });
    }
    info!(meter = %id, records = count, elapsed = ?start.elapsed(), "reading delivered");
    Outcome::Delivered { records: count }
}
