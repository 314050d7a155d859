//! Pipeline error types.

use thiserror::Error;

use clipscene_media::MediaError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every acquisition strategy failed
    #[error("Failed to download video: {0}")]
    Acquisition(#[source] MediaError),

    /// Request rejected before any work was scheduled
    #[error("{0}")]
    Validation(String),

    #[error("Clip {clip_number} failed: {source}")]
    ClipExtraction {
        clip_number: usize,
        #[source]
        source: MediaError,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Short machine-readable name of the failure, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Acquisition(_) => "acquisition",
            PipelineError::Validation(_) => "validation",
            PipelineError::ClipExtraction { .. } => "clip_extraction",
            PipelineError::NotFound(_) => "not_found",
            PipelineError::Archive(_) => "archive",
            PipelineError::Media(_) => "media",
            PipelineError::Io(_) => "io",
        }
    }

    /// Underlying tool failure, if any.
    pub fn media_error(&self) -> Option<&MediaError> {
        match self {
            PipelineError::Acquisition(e)
            | PipelineError::ClipExtraction { source: e, .. }
            | PipelineError::Media(e) => Some(e),
            _ => None,
        }
    }

    /// Caller errors, as opposed to failures of the service itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Validation(_) | PipelineError::NotFound(_))
    }
}

impl From<zip::result::ZipError> for PipelineError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Archive(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipscene_models::Timestamp;

    #[test]
    fn test_messages() {
        let err = PipelineError::Acquisition(MediaError::download_failed("HTTP Error 404"));
        assert_eq!(
            err.to_string(),
            "Failed to download video: Download failed: HTTP Error 404"
        );

        let err = PipelineError::ClipExtraction {
            clip_number: 2,
            source: MediaError::InvalidRange {
                start: Timestamp::from_secs(60),
                end: Timestamp::from_secs(50),
            },
        };
        assert_eq!(
            err.to_string(),
            "Clip 2 failed: Start time 00:01:00 must be before end time 00:00:50"
        );
    }

    #[test]
    fn test_kinds() {
        let err = PipelineError::ClipExtraction {
            clip_number: 1,
            source: MediaError::timed_out(300, String::new()),
        };
        assert_eq!(err.kind(), "clip_extraction");
        assert_eq!(err.media_error().map(MediaError::kind), Some("timeout"));
        assert_eq!(PipelineError::validation("x").media_error().map(MediaError::kind), None);
    }

    #[test]
    fn test_client_errors() {
        assert!(PipelineError::validation("bad").is_client_error());
        assert!(PipelineError::not_found("gone").is_client_error());
        assert!(!PipelineError::archive("zip").is_client_error());
    }
}
