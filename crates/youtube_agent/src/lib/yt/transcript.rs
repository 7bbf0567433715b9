use yt_transcript_rs::api::YouTubeTranscriptApi;

use crate::yt::{extract_video_id, TranscriptError, TranscriptFetcher};

/// A timed piece of caption text.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub start: f64,
    pub text: String,
}

pub struct YoutubeTranscripts {
    api: YouTubeTranscriptApi,
    chunk_size_seconds: f64,
}

impl YoutubeTranscripts {
    pub const DEFAULT_CHUNK_SIZE_SECONDS: f64 = 30.0;

    pub fn new() -> Result<Self, TranscriptError> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| TranscriptError::Client(e.to_string()))?;

        Ok(Self {
            api,
            chunk_size_seconds: Self::DEFAULT_CHUNK_SIZE_SECONDS,
        })
    }

    pub fn with_chunk_size(mut self, seconds: u16) -> Self {
        self.chunk_size_seconds = f64::from(seconds.max(1));
        self
    }
}

impl TranscriptFetcher for YoutubeTranscripts {
    type Error = TranscriptError;

    #[tracing::instrument(skip(self))]
    async fn fetch(&self, video_ref: &str, languages: &[String]) -> Result<Vec<String>, Self::Error> {
        let video_id = extract_video_id(video_ref)?;
        let languages = languages.iter().map(String::as_str).collect::<Vec<_>>();

        let transcript = self
            .api
            .fetch_transcript(&video_id, &languages, false)
            .await
            .inspect_err(|e| tracing::error!(error = %e, %video_id, "Failed to fetch transcript"))
            .map_err(|e| TranscriptError::Fetch {
                video_id: video_id.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            %video_id,
            language = %transcript.language_code,
            snippets = transcript.snippets.len(),
            "Fetched transcript"
        );

        let snippets = transcript
            .snippets
            .into_iter()
            .map(|s| Snippet {
                start: s.start,
                text: s.text,
            })
            .collect::<Vec<_>>();

        let chunks = group_into_chunks(&snippets, self.chunk_size_seconds);
        if chunks.is_empty() {
            return Err(TranscriptError::Empty(video_id));
        }

        Ok(chunks)
    }
}

/// Groups snippets into consecutive windows of `window_seconds`.
///
/// Snippet texts within a window are joined by a single space. Every chunk
/// except the last ends with a space so plain concatenation reads naturally.
pub fn group_into_chunks(snippets: &[Snippet], window_seconds: f64) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut window_end = window_seconds;

    for snippet in snippets {
        let text = snippet.text.trim();
        if text.is_empty() {
            continue;
        }

        if snippet.start >= window_end && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
        }
        if snippet.start >= window_end {
            window_end = ((snippet.start / window_seconds).floor() + 1.0) * window_seconds;
        }
        current.push(text);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    let last = chunks.len().saturating_sub(1);
    for chunk in chunks.iter_mut().take(last) {
        chunk.push(' ');
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(start: f64, text: &str) -> Snippet {
        Snippet {
            start,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_groups_snippets_by_window() {
        let snippets = vec![
            snippet(0.0, "hello"),
            snippet(12.5, "there"),
            snippet(31.0, "general"),
            snippet(95.0, "kenobi"),
        ];

        let chunks = group_into_chunks(&snippets, 30.0);

        assert_eq!(chunks, vec!["hello there ", "general ", "kenobi"]);
        assert_eq!(chunks.concat(), "hello there general kenobi");
    }

    #[test]
    fn test_long_gaps_jump_straight_to_the_next_window() {
        let snippets = vec![
            snippet(0.0, "intro"),
            snippet(1.0e12, "far"),
            snippet(1.0e12 + 10.0, "away"),
            snippet(1.0e12 + 45.0, "later"),
        ];

        assert_eq!(
            group_into_chunks(&snippets, 30.0),
            vec!["intro ", "far away ", "later"]
        );
    }

    #[test]
    fn test_blank_snippets_are_dropped() {
        let snippets = vec![snippet(0.0, "  "), snippet(40.0, "\n"), snippet(41.0, " only ")];
        assert_eq!(group_into_chunks(&snippets, 30.0), vec!["only"]);
    }

    #[test]
    fn test_no_snippets_yields_no_chunks() {
        assert!(group_into_chunks(&[], 30.0).is_empty());
    }
}
