// THEORY:
// Every fallible operation in the engine reports through one crate-level error
// enum. The geometry errors (`OutOfRange`) are contract violations: callers are
// expected to validate coordinates against known surface dimensions before
// calling, and the engine never clamps silently because a clamped read would
// corrupt scan results. `InvalidSeed` is the same programmer-error class for
// the flood counter. `Cancelled` is deliberately part of this enum so the
// session loop can surface a stop request through the same `?` plumbing as a
// real failure while still being distinguishable from one.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VisionError>;

#[derive(Debug, Error)]
pub enum VisionError {
    /// A coordinate or rectangle lies outside the working surface.
    #[error("point ({x}, {y}) is outside the {width}x{height} working surface")]
    OutOfRange {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    /// An argument violated a documented precondition (bad ratio, empty rect, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A flood-count seed pixel did not match the classifier or was already visited.
    #[error("seed pixel ({x}, {y}) is not a valid start for a flood count")]
    InvalidSeed { x: i32, y: i32 },

    /// A scene operation ran before the anchor markers were located.
    #[error("anchor positions are not set")]
    AnchorsNotSet,

    /// The capture source could not supply display data or pixels. Fatal to a run.
    #[error("capture source failure: {0}")]
    CaptureFailed(String),

    /// The action sink rejected a key or mouse command.
    #[error("input dispatch failure: {0}")]
    InputFailed(String),

    /// Cooperative stop request. Not a failure; never logged as one.
    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("settings (de)serialization failed: {0}")]
    Settings(#[from] serde_json::Error),
}

impl VisionError {
    /// True for the cooperative stop condition, which callers must not treat
    /// or report as an error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, VisionError::Cancelled)
    }
}
