//! Apply the CPU quota to the host runtime's parallelism knob.
//!
//! # Example
//!
//! ```rust,ignore
//! use maxprocs::Options;
//!
//! let (undo, result) = maxprocs::set(Options::new().tracing_logger());
//! if let Err(e) = result {
//!     tracing::warn!("failed to set parallelism: {}", e);
//! }
//! undo.keep();
//!
//! let workers = maxprocs::current();
//! ```

mod error;
mod knob;
mod options;

pub use error::Error;
pub use knob::{current, GlobalKnob, ParallelismKnob, Undo, DEFAULT_KNOB_NAME};
pub use options::{LogFn, Options, ProcsFn};

use std::env;

use tracing::warn;

use crate::runtime::{CpuQuotaStatus, AUTO_MIN_PARALLELISM};

/// What [`apply`] did to the knob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The override variable was present; cgroups were not read.
    EnvOverride { key: String, value: String },
    /// The quota was computed. The knob is unchanged when `status` is
    /// [`CpuQuotaStatus::Undefined`].
    Quota { procs: i32, status: CpuQuotaStatus },
}

impl Applied {
    /// Quota status acted on, `None` when the override won.
    pub fn status(&self) -> Option<CpuQuotaStatus> {
        match self {
            Self::EnvOverride { .. } => None,
            Self::Quota { status, .. } => Some(*status),
        }
    }
}

/// Set the knob from the CPU quota unless the override variable is present.
///
/// The returned [`Undo`] is usable in every case, including on error; on
/// error the knob is left unchanged.
pub fn set(options: Options) -> (Undo, Result<(), Error>) {
    let (undo, result) = apply(options);
    (undo, result.map(|_| ()))
}

/// Same as [`set`], reporting which branch was taken.
pub fn apply(options: Options) -> (Undo, Result<Applied, Error>) {
    let knob = options.knob.clone();
    let name = knob.name().to_string();
    let prev = knob.get();
    let undo = Undo::new(knob.clone(), prev, options.log.clone());

    let env_key = options.env_key_or_default();
    if let Some(value) = env::var_os(env_key) {
        options.log(format_args!(
            "maxprocs: honoring explicitly-configured {}={:?} from environment",
            env_key, value
        ));
        let applied = Applied::EnvOverride {
            key: env_key.to_string(),
            value: value.to_string_lossy().into_owned(),
        };
        return (undo, Ok(applied));
    }

    let (procs, status) = match (options.procs)(options.min) {
        Ok(result) => result,
        Err(e) => return (undo, Err(e)),
    };

    match status {
        CpuQuotaStatus::Undefined => {
            options.log(format_args!(
                "maxprocs: leaving {}={}: CPU quota undefined",
                name, prev
            ));
        }
        CpuQuotaStatus::MinUsed => {
            knob.set(procs.max(1) as usize);
            options.log(format_args!(
                "maxprocs: updating {}={}: using minimum allowed {}",
                name,
                knob.get(),
                name
            ));
        }
        CpuQuotaStatus::Used => {
            knob.set(procs.max(1) as usize);
            options.log(format_args!(
                "maxprocs: updating {}={}: determined from CPU quota",
                name,
                knob.get()
            ));
        }
    }

    (undo, Ok(Applied::Quota { procs, status }))
}

/// Apply the CPU quota to the process-wide knob with a floor of
/// [`AUTO_MIN_PARALLELISM`], logging through `tracing`, and keep it.
///
/// Call once at startup, before sizing worker pools from [`current`].
pub fn auto() -> Result<Applied, Error> {
    auto_with(Options::new().tracing_logger())
}

fn auto_with(options: Options) -> Result<Applied, Error> {
    let knob = options.knob.clone();
    let (undo, result) = apply(options.min(AUTO_MIN_PARALLELISM));
    undo.keep();
    if let Err(e) = &result {
        warn!(
            "maxprocs: leaving {}={}: error reading CPU quota: {}",
            knob.name(),
            knob.get(),
            e
        );
    }
    result
}
