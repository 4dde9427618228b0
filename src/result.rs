use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("map extent has no area")]
    DegenerateExtent,
    #[error("focus area is missing or does not intersect the map extent")]
    EmptyFocus,
    #[error("dem grid must be at least 2 x 2 points")]
    GridTooSmall,
    #[error("interior tile block is not rectangular")]
    NonRectangularInterior,
    #[error("source read failed: {0}")]
    SourceRead(String),
    #[error("output write failed")]
    Io(#[from] std::io::Error),
    #[error("record serialization failed")]
    Serialize(#[from] serde_json::Error),
    #[error("texture encoding failed")]
    Image(#[from] image::ImageError),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// How an export run ended. Cancellation through the progress callback is a
/// clean outcome, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    Completed,
    Cancelled,
}
