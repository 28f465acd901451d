//! Paced re-emission of a complete reply as a sequence of frames.
//!
//! The engine returns a whole reply at once; [`StreamFramer`] approximates
//! token streaming by disclosing it a few words at a time with a fixed
//! delay between frames. A future engine that streams natively can feed
//! the same [`ReplyEnvelope`] frames without changing the wire contract.
//!
//! # Frame modes
//!
//! - [`FrameMode::Cumulative`] (default): each frame carries the reply text
//!   up to and including the current chunk, so content grows monotonically
//!   and the last frame equals the full reply verbatim. A client that drops
//!   frames still ends up with the right text.
//! - [`FrameMode::Replace`]: each frame carries only its own chunk of words,
//!   joined by single spaces. Clients must concatenate.
//!
//! The returned stream is lazy and single-pass: nothing is produced until
//! it is polled, and dropping it (e.g. on client disconnect) stops it.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::types::chat::{new_reply_id, ReplyEnvelope};
use crate::utilities::clock::Clock;

/// Words disclosed per frame.
pub const DEFAULT_CHUNK_WORDS: usize = 3;
/// Delay between consecutive frames.
pub const DEFAULT_PACING: Duration = Duration::from_millis(100);
/// Wall-clock budget for one stream.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(60);

/// Stream of frames for one reply.
pub type FrameStream = BoxStream<'static, ReplyEnvelope>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameMode {
    #[default]
    Cumulative,
    Replace,
}

impl FromStr for FrameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cumulative" | "accumulate" => Ok(Self::Cumulative),
            "replace" => Ok(Self::Replace),
            other => Err(format!("unknown frame mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramerConfig {
    pub chunk_words: usize,
    pub pacing: Duration,
    pub mode: FrameMode,
    /// Once exceeded, the rest of the reply is sent in one final frame.
    pub budget: Option<Duration>,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            chunk_words: DEFAULT_CHUNK_WORDS,
            pacing: DEFAULT_PACING,
            mode: FrameMode::Cumulative,
            budget: Some(DEFAULT_BUDGET),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamFramer {
    config: FramerConfig,
    clock: Arc<dyn Clock>,
}

impl StreamFramer {
    pub fn new(mut config: FramerConfig, clock: Arc<dyn Clock>) -> Self {
        config.chunk_words = config.chunk_words.max(1);
        Self { config, clock }
    }

    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    /// Number of frames `text` will be split into: one per chunk of words,
    /// and a single frame when `text` has no words at all.
    pub fn frame_count(&self, text: &str) -> usize {
        frame_count(word_spans(text).len(), self.config.chunk_words)
    }

    /// Frame `full_text` under a freshly generated reply id.
    pub fn frame(&self, full_text: String) -> FrameStream {
        self.frame_with_id(new_reply_id(), full_text)
    }

    /// Frame `full_text`; every frame carries `id`.
    pub fn frame_with_id(&self, id: String, full_text: String) -> FrameStream {
        let spans = word_spans(&full_text);
        let total = frame_count(spans.len(), self.config.chunk_words);
        let cursor = FrameCursor {
            id,
            text: full_text,
            spans,
            total,
            next: 0,
            last_created: i64::MIN,
            started: Instant::now(),
            config: self.config,
            clock: Arc::clone(&self.clock),
        };

        stream::unfold(cursor, |mut cur| async move {
            if cur.next >= cur.total {
                return None;
            }
            let first = cur.next;
            if first > 0 {
                let over_budget = cur
                    .config
                    .budget
                    .is_some_and(|budget| cur.started.elapsed() >= budget);
                if over_budget {
                    tracing::debug!(
                        remaining = cur.total - first,
                        "stream budget exhausted; flushing remainder"
                    );
                    cur.next = cur.total - 1;
                } else {
                    tokio::time::sleep(cur.config.pacing).await;
                }
            }
            let last = cur.next;
            cur.next += 1;

            let content = cur.content(first, last);
            let created = cur.clock.unix_seconds().max(cur.last_created);
            cur.last_created = created;

            Some((ReplyEnvelope::with_id(cur.id.clone(), content, created), cur))
        })
        .boxed()
    }
}

struct FrameCursor {
    id: String,
    text: String,
    /// Byte ranges of the whitespace-separated words of `text`.
    spans: Vec<(usize, usize)>,
    total: usize,
    next: usize,
    last_created: i64,
    started: Instant,
    config: FramerConfig,
    clock: Arc<dyn Clock>,
}

impl FrameCursor {
    /// Content of a frame covering chunks `first..=last`.
    fn content(&self, first: usize, last: usize) -> String {
        if self.spans.is_empty() {
            return self.text.clone();
        }
        let chunk = self.config.chunk_words;
        let end_word = ((last + 1) * chunk).min(self.spans.len());

        match self.config.mode {
            FrameMode::Cumulative if last + 1 == self.total => self.text.clone(),
            FrameMode::Cumulative => self.text[..self.spans[end_word - 1].1].to_string(),
            FrameMode::Replace => self.spans[first * chunk..end_word]
                .iter()
                .map(|&(start, end)| &self.text[start..end])
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn frame_count(words: usize, chunk_words: usize) -> usize {
    words.div_ceil(chunk_words.max(1)).max(1)
}

fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (idx, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, idx));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::clock::{FixedClock, SystemClock};

    fn framer(mode: FrameMode, pacing: Duration) -> StreamFramer {
        let clock = Arc::new(FixedClock::parse("2024-03-05T12:00:00+00:00").unwrap());
        StreamFramer::new(
            FramerConfig {
                chunk_words: 3,
                pacing,
                mode,
                budget: None,
            },
            clock,
        )
    }

    async fn collect(framer: &StreamFramer, text: &str) -> Vec<ReplyEnvelope> {
        framer.frame(text.to_string()).collect().await
    }

    #[test]
    fn test_word_spans() {
        let text = "  one two\n\nthree ";
        let words: Vec<_> = word_spans(text)
            .into_iter()
            .map(|(s, e)| &text[s..e])
            .collect();
        assert_eq!(words, vec!["one", "two", "three"]);
        assert!(word_spans("   ").is_empty());
    }

    #[test]
    fn test_frame_count_is_ceil_of_chunks() {
        let f = framer(FrameMode::Cumulative, Duration::ZERO);
        assert_eq!(f.frame_count("a"), 1);
        assert_eq!(f.frame_count("a b c"), 1);
        assert_eq!(f.frame_count("a b c d"), 2);
        assert_eq!(f.frame_count("a b c d e f g"), 3);
        assert_eq!(f.frame_count(""), 1);
    }

    #[tokio::test]
    async fn test_cumulative_frames_grow_and_end_with_full_text() {
        let f = framer(FrameMode::Cumulative, Duration::ZERO);
        let text = "Today is March 05, 2024. How may I assist you further?";
        let frames = collect(&f, text).await;

        assert_eq!(frames.len(), 4); // 11 words
        assert_eq!(frames[0].content(), "Today is March");
        assert_eq!(frames[1].content(), "Today is March 05, 2024. How");
        for pair in frames.windows(2) {
            assert!(pair[1].content().starts_with(pair[0].content()));
        }
        assert_eq!(frames.last().unwrap().content(), text);
    }

    #[tokio::test]
    async fn test_cumulative_final_frame_preserves_whitespace() {
        let f = framer(FrameMode::Cumulative, Duration::ZERO);
        let text = "Line one here.\n\nLine two follows ";
        let frames = collect(&f, text).await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].content(), "Line one here.");
        assert_eq!(frames[1].content(), text);
    }

    #[tokio::test]
    async fn test_replace_frames_concatenate_to_reply() {
        let f = framer(FrameMode::Replace, Duration::ZERO);
        let text = "one two three four five six seven";
        let frames = collect(&f, text).await;

        let contents: Vec<_> = frames.iter().map(|f| f.content()).collect();
        assert_eq!(contents, vec!["one two three", "four five six", "seven"]);
        assert_eq!(contents.join(" "), text);
    }

    #[tokio::test]
    async fn test_frames_share_one_id() {
        let f = framer(FrameMode::Cumulative, Duration::ZERO);
        let frames = collect(&f, "a b c d e f g h i j").await;
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|fr| fr.id == frames[0].id));
        assert!(frames.iter().all(|fr| fr.created == 1_709_640_000));

        let other = collect(&f, "a b c d e f g h i j").await;
        assert_ne!(other[0].id, frames[0].id);
    }

    #[tokio::test]
    async fn test_created_is_non_decreasing() {
        let f = StreamFramer::new(
            FramerConfig {
                pacing: Duration::from_millis(1),
                ..FramerConfig::default()
            },
            Arc::new(SystemClock),
        );
        let frames = collect(&f, "a b c d e f g h i j k l").await;
        for pair in frames.windows(2) {
            assert!(pair[1].created >= pair[0].created);
        }
    }

    #[tokio::test]
    async fn test_empty_reply_yields_single_frame() {
        let f = framer(FrameMode::Cumulative, Duration::ZERO);
        let frames = collect(&f, "").await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].content(), "");

        let f = framer(FrameMode::Replace, Duration::ZERO);
        assert_eq!(collect(&f, "").await.len(), 1);
    }

    #[tokio::test]
    async fn test_frames_are_paced() {
        let f = framer(FrameMode::Cumulative, Duration::from_millis(20));
        let started = std::time::Instant::now();
        let frames = collect(&f, "a b c d e f g h i").await;
        assert_eq!(frames.len(), 3);
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_first_frame_is_not_delayed() {
        let f = framer(FrameMode::Cumulative, Duration::from_secs(30));
        let mut stream = f.frame("a b c d e f".to_string());
        let first = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("first frame should be immediate");
        assert_eq!(first.unwrap().content(), "a b c");
    }

    #[tokio::test]
    async fn test_dropped_stream_stops_early() {
        let f = framer(FrameMode::Cumulative, Duration::ZERO);
        let frames: Vec<_> = f
            .frame("a b c d e f g h i j k l".to_string())
            .take(2)
            .collect()
            .await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].content(), "a b c d e f");
    }

    #[tokio::test]
    async fn test_exhausted_budget_flushes_remainder() {
        let clock = Arc::new(FixedClock::parse("2024-03-05T12:00:00+00:00").unwrap());
        let text = "one two three four five six seven eight nine ten";

        let cumulative = StreamFramer::new(
            FramerConfig {
                chunk_words: 3,
                pacing: Duration::from_secs(30),
                mode: FrameMode::Cumulative,
                budget: Some(Duration::ZERO),
            },
            clock.clone(),
        );
        let frames = collect(&cumulative, text).await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].content(), text);

        let replace = StreamFramer::new(
            FramerConfig {
                chunk_words: 3,
                pacing: Duration::from_secs(30),
                mode: FrameMode::Replace,
                budget: Some(Duration::ZERO),
            },
            clock,
        );
        let frames = collect(&replace, text).await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].content(), "four five six seven eight nine ten");
    }

    #[test]
    fn test_frame_mode_parsing() {
        assert_eq!("cumulative".parse::<FrameMode>(), Ok(FrameMode::Cumulative));
        assert_eq!(" Replace ".parse::<FrameMode>(), Ok(FrameMode::Replace));
        assert!("bogus".parse::<FrameMode>().is_err());
    }

    #[test]
    fn test_zero_chunk_words_is_clamped() {
        let f = StreamFramer::new(
            FramerConfig {
                chunk_words: 0,
                ..FramerConfig::default()
            },
            Arc::new(SystemClock),
        );
        assert_eq!(f.config().chunk_words, 1);
        assert_eq!(f.frame_count("a b"), 2);
    }
}
