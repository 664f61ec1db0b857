//! Background odometry task
//!
//! Runs an [`Odometer`] periodically on its own thread until stopped,
//! optionally archiving each pose.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};

// Internal
use super::{OdomError, Odometer, PoseHandle};
use util::{archive::Archiver, time::Clock};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle to a running odometry thread.
///
/// The thread is stopped and joined when the handle is dropped.
pub struct OdomTask {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    pose: PoseHandle,
}

/// A single row of the pose archive.
#[derive(Debug, Serialize)]
struct PoseRecord {
    time_ms: u64,
    x: f64,
    y: f64,
    theta: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OdomTask {
    /// Spawn a thread stepping `odometer` every `period_ms`.
    ///
    /// If an archiver is given every pose is written to it. The archive is
    /// abandoned after the first write failure, odometry keeps running.
    pub fn spawn<O>(
        mut odometer: O,
        clock: Arc<dyn Clock>,
        period_ms: u64,
        mut archiver: Option<Archiver>,
    ) -> Result<Self, OdomError>
    where
        O: Odometer + Send + 'static,
    {
        if period_ms == 0 {
            return Err(OdomError::ZeroPeriod);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let pose = odometer.pose();

        let thread_stop = stop.clone();
        let handle = thread::Builder::new()
            .name("odom".into())
            .spawn(move || {
                let mut wake_ms = clock.millis();
                let mut cycles: u64 = 0;

                while !thread_stop.load(Ordering::Relaxed) {
                    let pose = odometer.step();
                    cycles += 1;

                    if let Some(arch) = archiver.as_mut() {
                        let record = PoseRecord {
                            time_ms: clock.millis(),
                            x: pose.x,
                            y: pose.y,
                            theta: pose.theta,
                        };

                        if let Err(e) = arch.serialise(record) {
                            warn!("Pose archiving stopped: {}", e);
                            archiver = None;
                        }
                    }

                    clock.delay_until(&mut wake_ms, period_ms);
                }

                trace!("Odometry thread exiting after {} cycles", cycles);
            })
            .map_err(OdomError::SpawnError)?;

        info!("Odometry task started with a period of {} ms", period_ms);

        Ok(Self {
            stop,
            handle: Some(handle),
            pose,
        })
    }

    /// Handle to the pose being updated by the task.
    pub fn pose(&self) -> PoseHandle {
        self.pose.clone()
    }

    /// Whether the thread is still running.
    pub fn is_running(&self) -> bool {
        match self.handle {
            Some(ref h) => !h.is_finished(),
            None => false,
        }
    }

    /// Stop the thread and wait for it to finish.
    pub fn stop(mut self) -> Result<(), OdomError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), OdomError> {
        self.stop.store(true, Ordering::Relaxed);

        match self.handle.take() {
            Some(h) => {
                h.join().map_err(|_| OdomError::TaskPanicked)?;
                info!("Odometry task stopped");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for OdomTask {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("{}", e);
        }
    }
}
