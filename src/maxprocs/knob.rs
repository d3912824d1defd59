//! The host runtime's parallelism setting.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::options::LogFn;

/// Default knob name, also the default override variable.
pub const DEFAULT_KNOB_NAME: &str = "GOMAXPROCS";

/// A process-wide parallelism setting that [`set`](super::set) adjusts.
pub trait ParallelismKnob: Send + Sync {
    /// Name used in log messages and as the default override variable.
    fn name(&self) -> &str;

    fn get(&self) -> usize;

    fn set(&self, procs: usize);
}

/// 0 until first read, then the current value.
static MAX_PROCS: AtomicUsize = AtomicUsize::new(0);

/// The crate's own knob, shared by the whole process.
///
/// Starts at the number of logical CPUs. Runtimes read it with
/// [`current`] when sizing their worker pools.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalKnob;

impl ParallelismKnob for GlobalKnob {
    fn name(&self) -> &str {
        DEFAULT_KNOB_NAME
    }

    fn get(&self) -> usize {
        let procs = MAX_PROCS.load(Ordering::Acquire);
        if procs != 0 {
            return procs;
        }

        let cpus = num_cpus::get().max(1);
        match MAX_PROCS.compare_exchange(0, cpus, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => cpus,
            Err(existing) => existing,
        }
    }

    fn set(&self, procs: usize) {
        MAX_PROCS.store(procs.max(1), Ordering::Release);
    }
}

/// Current value of the process-wide knob.
pub fn current() -> usize {
    GlobalKnob.get()
}

/// Restores a knob to the value it had before [`set`](super::set).
///
/// Restoration happens on [`undo`](Undo::undo) or on drop; call
/// [`keep`](Undo::keep) to leave the new value in place.
#[must_use = "dropping the guard restores the previous parallelism"]
pub struct Undo {
    restore: Option<Restore>,
}

struct Restore {
    knob: Arc<dyn ParallelismKnob>,
    prev: usize,
    log: Option<LogFn>,
}

impl Undo {
    pub(crate) fn new(knob: Arc<dyn ParallelismKnob>, prev: usize, log: Option<LogFn>) -> Self {
        Self {
            restore: Some(Restore { knob, prev, log }),
        }
    }

    /// Value the knob will be reset to.
    pub fn previous(&self) -> Option<usize> {
        self.restore.as_ref().map(|r| r.prev)
    }

    /// Reset the knob now.
    pub fn undo(mut self) {
        self.restore_now();
    }

    /// Keep the current value for the rest of the process.
    pub fn keep(mut self) {
        self.restore.take();
    }

    fn restore_now(&mut self) {
        if let Some(restore) = self.restore.take() {
            if let Some(log) = &restore.log {
                log(format_args!(
                    "maxprocs: resetting {} to {}",
                    restore.knob.name(),
                    restore.prev
                ));
            }
            restore.knob.set(restore.prev);
        }
    }
}

impl Drop for Undo {
    fn drop(&mut self) {
        self.restore_now();
    }
}

impl fmt::Debug for Undo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Undo")
            .field("previous", &self.previous())
            .finish()
    }
}
