//! # LogWriter: structured logging of runtime events
//!
//! Turns every [`Event`] into one `tracing` record. Failures are logged at
//! `warn`/`error`, phase progress at `debug`, everything else at `info`.
//!
//! ## Example output (fmt layer)
//! ```text
//! DEBUG unitvisor: phase completed unit="database" phase=load
//! ERROR unitvisor: phase failed unit="auth" phase=start reason="fatal error: no key"
//!  INFO unitvisor: worker forked worker=1 pid=4242 reason="initial"
//!  WARN unitvisor: worker died worker=1 pid=4242 exit_code=Some(1)
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event subscriber that writes through `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let unit = e.unit.as_deref().unwrap_or("-");
        let phase = e.phase.map_or("-", |p| p.as_label());
        let reason = e.reason.as_deref().unwrap_or("");
        let worker = e.worker.unwrap_or_default();

        match e.kind {
            EventKind::PhaseStarting => debug!(target: "unitvisor", unit, phase, "phase starting"),
            EventKind::PhaseCompleted => debug!(target: "unitvisor", unit, phase, "phase completed"),
            EventKind::PhaseSkipped => {
                debug!(target: "unitvisor", unit, phase, state = reason, "phase skipped")
            }
            EventKind::PhaseFailed => error!(target: "unitvisor", unit, phase, reason, "phase failed"),
            EventKind::TimeoutHit => {
                warn!(target: "unitvisor", unit, phase, timeout_ms = e.timeout_ms, "phase timed out")
            }
            EventKind::RouterMounted => {
                debug!(target: "unitvisor", unit, segment = reason, "router mounted")
            }
            EventKind::WorkerForked => {
                info!(target: "unitvisor", worker, pid = e.pid, reason, "worker forked")
            }
            EventKind::WorkerOnline => info!(target: "unitvisor", worker, pid = e.pid, "worker online"),
            EventKind::WorkerListening => {
                info!(target: "unitvisor", worker, pid = e.pid, "worker listening")
            }
            EventKind::WorkerBootstrapTimeout => warn!(
                target: "unitvisor",
                worker,
                pid = e.pid,
                timeout_ms = e.timeout_ms,
                consecutive = e.attempt,
                "worker did not come online; killing"
            ),
            EventKind::WorkerDisconnecting => {
                info!(target: "unitvisor", worker, pid = e.pid, "worker disconnecting")
            }
            EventKind::WorkerExited => info!(
                target: "unitvisor",
                worker,
                pid = e.pid,
                exit_code = ?e.exit_code.flatten(),
                "worker exited"
            ),
            EventKind::WorkerDied => warn!(
                target: "unitvisor",
                worker,
                pid = e.pid,
                exit_code = ?e.exit_code.flatten(),
                "worker died"
            ),
            EventKind::WorkerAbandoned => {
                error!(target: "unitvisor", worker, reason, "worker slot abandoned")
            }
            EventKind::ShutdownRequested => info!(target: "unitvisor", "shutdown requested"),
            EventKind::AllStoppedWithin => info!(target: "unitvisor", "all stopped within grace"),
            EventKind::GraceExceeded => warn!(target: "unitvisor", "grace exceeded"),
            EventKind::SubscriberOverflow => {
                warn!(target: "unitvisor", subscriber = unit, reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                error!(target: "unitvisor", subscriber = unit, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
