//! Tick callback that reports progress and optionally keeps a replay.
//!
//! Every tick is logged at debug level. Every `interval` ticks, and on any
//! tick that resolves a task, a one-line progress report goes out at info
//! level. When a replay is requested, every snapshot is kept for
//! [`ProgressLog::write_replay`].

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use gridfleet_core::{SimulationState, SnapshotRecorder, TickCallback, TickSummary};
use tracing::{debug, info};

use crate::error::EngineError;

/// Progress reporter for a fleet run.
pub struct ProgressLog {
    /// Ticks between unconditional progress lines.
    interval: u64,
    /// Snapshot history, when a replay was requested.
    recorder: Option<SnapshotRecorder>,
}

impl ProgressLog {
    /// Report every `interval` ticks; keep a replay if `record` is set.
    pub fn new(interval: u64, record: bool, state: &SimulationState) -> Self {
        Self {
            interval: interval.max(1),
            recorder: record.then(|| SnapshotRecorder::starting_from(state)),
        }
    }

    /// Write the recorded snapshots to `path` as a JSON array.
    ///
    /// Does nothing if no replay was requested.
    pub fn write_replay(&self, path: &Path) -> Result<(), EngineError> {
        let Some(recorder) = &self.recorder else {
            return Ok(());
        };
        let file = File::create(path).map_err(|e| EngineError::Replay {
            message: format!("failed to create {}: {e}", path.display()),
        })?;
        serde_json::to_writer(BufWriter::new(file), recorder.frames()).map_err(|e| {
            EngineError::Replay {
                message: format!("failed to write {}: {e}", path.display()),
            }
        })?;
        info!(
            path = %path.display(),
            frames = recorder.frames().len(),
            "Replay written"
        );
        Ok(())
    }
}

impl TickCallback for ProgressLog {
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState) {
        debug!(
            tick = summary.tick,
            moved = summary.moved,
            waited = summary.waited,
            unreachable = summary.unreachable,
            claims = summary.claims.len(),
            spawned = summary.events.spawned,
            removed = summary.events.removed,
            remaining = summary.remaining,
            "Tick complete"
        );

        let on_interval = summary.tick.checked_rem(self.interval) == Some(0);
        if on_interval || !summary.claims.is_empty() {
            let resolved: u32 = state
                .agents()
                .iter()
                .map(gridfleet_agents::Agent::completed)
                .fold(0, u32::saturating_add);
            info!(
                tick = summary.tick,
                resolved,
                remaining = summary.remaining,
                "Progress"
            );
        }

        if let Some(recorder) = &mut self.recorder {
            recorder.on_tick(summary, state);
        }
    }
}
