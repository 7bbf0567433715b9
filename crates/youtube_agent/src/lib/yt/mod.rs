pub mod transcript;

use std::{fmt::Debug, future::Future, sync::LazyLock};

use regex::Regex;

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:.*&)?v=|shorts/|embed/|live/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .unwrap()
});

static BARE_VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Not a YouTube video reference: {0}")]
    InvalidVideoRef(String),
    #[error("Transcript client error: {0}")]
    Client(String),
    #[error("Could not retrieve transcript for {video_id}: {reason}")]
    Fetch { video_id: String, reason: String },
    #[error("Transcript for {0} is empty")]
    Empty(String),
}

/// Source of spoken-text transcripts for a video.
pub trait TranscriptFetcher {
    type Error: Debug;

    /// Returns the transcript as ordered text chunks. Concatenating the chunks
    /// in order yields the full transcript.
    fn fetch(
        &self,
        video_ref: &str,
        languages: &[String],
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>>;
}

/// Extracts the 11 character video id from a YouTube url or bare id.
pub fn extract_video_id(reference: &str) -> Result<String, TranscriptError> {
    let reference = reference.trim();

    if BARE_VIDEO_ID_RE.is_match(reference) {
        return Ok(reference.to_string());
    }

    VIDEO_ID_RE
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| TranscriptError::InvalidVideoRef(reference.to_string()))
}
