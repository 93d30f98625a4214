//! Weighted progress across a batch.
//!
//! Each resource contributes three channels, each in `[0, 1]`:
//!
//! ```text
//! resource i:  [ download ][ decompress ][ install ]
//! batch:       3*i + download + decompress + install   of   3*R
//! ```
//!
//! Channel values never move backwards and the batch value is clamped to the
//! highest value already emitted, so observers see a non-decreasing sequence.

use parking_lot::Mutex;

/// Weight of one resource in the batch total.
pub const RESOURCE_WEIGHT: f64 = 3.0;

/// A point-in-time view of batch progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// What is happening right now.
    pub title: String,

    /// Completed work, in `[0, total]`.
    pub progress: f64,

    /// Total amount of work.
    pub total: f64,
}

impl ProgressSnapshot {
    /// Create a snapshot.
    pub fn new(title: impl Into<String>, progress: f64, total: f64) -> Self {
        Self {
            title: title.into(),
            progress,
            total,
        }
    }

    /// Progress as a fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total <= 0.0 {
            return 0.0;
        }
        (self.progress / self.total).clamp(0.0, 1.0)
    }
}

/// Per-resource progress channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Decompress,
    Install,
}

/// Channel values of the resource currently being processed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageProgress {
    pub download: f64,
    pub decompress: f64,
    pub install: f64,
}

impl StageProgress {
    /// All channels complete.
    pub fn complete() -> Self {
        Self {
            download: 1.0,
            decompress: 1.0,
            install: 1.0,
        }
    }

    fn channel_mut(&mut self, stage: Stage) -> &mut f64 {
        match stage {
            Stage::Download => &mut self.download,
            Stage::Decompress => &mut self.decompress,
            Stage::Install => &mut self.install,
        }
    }
}

/// Batch progress value for resource `index` with the given channel values.
pub fn combine(index: usize, stages: &StageProgress) -> f64 {
    RESOURCE_WEIGHT * index as f64
        + stages.download.clamp(0.0, 1.0)
        + stages.decompress.clamp(0.0, 1.0)
        + stages.install.clamp(0.0, 1.0)
}

struct State {
    index: usize,
    title: String,
    stages: StageProgress,
    last: f64,
}

/// Fans per-stage updates into batch snapshots.
///
/// Snapshots are emitted while the internal lock is held.
pub struct ProgressAggregator<'a> {
    total: f64,
    state: Mutex<State>,
    sink: &'a (dyn Fn(ProgressSnapshot) + Send + Sync),
}

impl<'a> ProgressAggregator<'a> {
    /// Create an aggregator for a batch of `resource_count` resources.
    pub fn new(resource_count: usize, sink: &'a (dyn Fn(ProgressSnapshot) + Send + Sync)) -> Self {
        Self {
            total: RESOURCE_WEIGHT * resource_count as f64,
            state: Mutex::new(State {
                index: 0,
                title: String::new(),
                stages: StageProgress::default(),
                last: 0.0,
            }),
            sink,
        }
    }

    /// Batch total (`3 * resource_count`).
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Start resource `index` with a fresh set of channels.
    pub fn begin_resource(&self, index: usize, title: impl Into<String>) {
        let mut state = self.state.lock();
        state.index = index;
        state.stages = StageProgress::default();
        state.title = title.into();
        self.emit(&mut state);
    }

    /// Change the title without touching progress.
    pub fn set_title(&self, title: impl Into<String>) {
        let mut state = self.state.lock();
        state.title = title.into();
        self.emit(&mut state);
    }

    /// Report a channel value. Lower values than already reported are ignored.
    pub fn update(&self, stage: Stage, value: f64) {
        let mut state = self.state.lock();
        let channel = state.stages.channel_mut(stage);
        let value = value.clamp(0.0, 1.0);
        if value <= *channel {
            return;
        }
        *channel = value;
        self.emit(&mut state);
    }

    /// Mark a channel as not applicable to this resource.
    pub fn skip(&self, stage: Stage) {
        self.update(stage, 1.0);
    }

    /// Fill every channel of the current resource.
    pub fn complete_resource(&self) {
        let mut state = self.state.lock();
        state.stages = StageProgress::complete();
        self.emit(&mut state);
    }

    /// Emit the terminal snapshot at `total`.
    pub fn finish(&self, title: impl Into<String>) {
        let mut state = self.state.lock();
        state.title = title.into();
        state.last = self.total;
        (self.sink)(ProgressSnapshot::new(state.title.clone(), self.total, self.total));
    }

    fn emit(&self, state: &mut State) {
        let value = combine(state.index, &state.stages)
            .min(self.total)
            .max(state.last);
        state.last = value;
        (self.sink)(ProgressSnapshot::new(state.title.clone(), value, self.total));
    }
}
