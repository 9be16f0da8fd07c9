use super::{ConnectionOptions, DriverError, MeterDriver, Target};
use crate::process::RawTable;
use tracing::trace;

/// An open driver session scoped to this guard. Dropping the guard closes the
/// session, so every exit path out of a per-meter read releases it exactly once.
pub struct SessionGuard<'d, D: MeterDriver> {
    driver: &'d D,
    session: Option<D::Session>,
}

impl<'d, D: MeterDriver> SessionGuard<'d, D> {
    pub fn open(
        driver: &'d D,
        target: &Target,
        options: &ConnectionOptions,
    ) -> Result<Self, DriverError> {
        let session = driver.connect(target, options)?;
        Ok(Self {
            driver,
            session: Some(session),
        })
    }

    pub fn read(&mut self, register_code: &str) -> Result<RawTable, DriverError> {
        match self.session.as_mut() {
            Some(session) => self.driver.read(session, register_code),
            None => Err(DriverError::Connection("session already closed".into())),
        }
    }

    /// Close now rather than at end of scope.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(session) = self.session.take() {
            trace!("closing driver session");
            self.driver.close(session);
        }
    }
}

impl<D: MeterDriver> Drop for SessionGuard<'_, D> {
    fn drop(&mut self) {
        self.release();
    }
}
