//! # Chunk Analyzer & Result Merger
//!
//! Sends each planned transcript chunk through the LLM capability, survives
//! individual chunk failures, and reassembles the partial results into one
//! briefing. Chunk-local analysis cannot know the source timeline, so any
//! timestamp the model volunteers is discarded and every key point's
//! timestamp is recovered through the quote matcher instead.

use itertools::Itertools;
use serde::Deserialize;

use crate::{
    chunk::{self, AnalysisChunk},
    error::Error,
    llm::json_repair,
    quote,
    subtitle::{display_time, Segment},
    Summarizer,
};

/// Upper bound on key points kept after merging.
pub const MAX_KEY_POINTS: usize = 8;

const ANALYZE_PROMPT: &str = include_str!("llm/prompts/analyze_0.txt");

/// One merged summary entry with its recovered timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPoint {
    pub point: String,
    pub explanation: String,
    /// Seconds into the source, always resolved (never negative).
    pub timestamp: f64,
    pub quote: Option<String>,
}

/// The merged result of all chunk analyses.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub summary: String,
    pub key_points: Vec<KeyPoint>,
}

/// LLM-shaped output of a single chunk. Unknown fields, including any
/// timestamp the model invents, are dropped on deserialization.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    summary: String,
    #[serde(default)]
    key_points: Vec<RawKeyPoint>,
}

#[derive(Debug, Deserialize)]
struct RawKeyPoint {
    point: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    quote: Option<String>,
}

/// Analyze the whole transcript and merge per-chunk results.
///
/// Chunks are processed sequentially to keep rate-limit behavior
/// predictable. A failed chunk is logged and skipped; only when every chunk
/// fails does the deterministic synthetic summary take over, so a report is
/// always produced.
#[tracing::instrument(skip_all)]
pub async fn analyze_all<S: Summarizer + Send + Sync>(
    summarizer: &S,
    transcript: &str,
    segments: &[Segment],
) -> Analysis {
    let chunks = chunk::plan(transcript, segments, S::CONTEXT_WINDOW_LIMIT);
    let total = chunks.len();

    let mut partials = Vec::new();
    for (idx, chunk) in chunks.iter().enumerate() {
        match analyze_chunk(summarizer, chunk).await {
            Ok(analysis) => partials.push(analysis),
            Err(e) => {
                tracing::warn!(chunk = idx + 1, total, error = %e, "Skipping failed chunk");
            }
        }
    }

    if partials.is_empty() {
        tracing::warn!("No chunk produced usable analysis, emitting synthetic summary");
        return synthetic_summary(segments);
    }

    merge_analyses(partials, segments)
}

async fn analyze_chunk<S: Summarizer>(
    summarizer: &S,
    chunk: &AnalysisChunk,
) -> Result<RawAnalysis, Error> {
    let prompt = ANALYZE_PROMPT.replace("{transcript}", &chunk.text);
    let raw = summarizer
        .complete(&prompt)
        .await
        .map_err(|e| Error::Analysis(format!("{e:?}")))?;
    json_repair::extract_json(&raw)
}

fn merge_analyses(partials: Vec<RawAnalysis>, segments: &[Segment]) -> Analysis {
    let summary = partials
        .iter()
        .map(|p| p.summary.trim())
        .filter(|s| !s.is_empty())
        .join(" ");

    let key_points = partials
        .into_iter()
        .flat_map(|p| p.key_points)
        .filter(|kp| !kp.point.trim().is_empty())
        .unique_by(|kp| kp.point.trim().to_lowercase())
        .take(MAX_KEY_POINTS)
        .map(|kp| resolve_key_point(kp, segments))
        .collect();

    Analysis {
        summary,
        key_points,
    }
}

/// Recover a key point's timestamp from its quote (or, lacking one, its
/// title) via the tiered segment matcher.
fn resolve_key_point(raw: RawKeyPoint, segments: &[Segment]) -> KeyPoint {
    let quote = raw.quote.filter(|q| !q.trim().is_empty());
    let query = quote.as_deref().unwrap_or(&raw.point);
    let timestamp = quote::match_segment(query, segments)
        .map(|seg| seg.start.max(0.0))
        .unwrap_or(0.0);

    KeyPoint {
        point: raw.point,
        explanation: raw.explanation,
        timestamp,
        quote,
    }
}

/// Deterministic summary built from segment statistics alone; the last line
/// of defense when the model never returns usable output.
fn synthetic_summary(segments: &[Segment]) -> Analysis {
    if segments.is_empty() {
        return Analysis {
            summary: "No speech was recognized in this video.".into(),
            key_points: Vec::new(),
        };
    }

    let end = segments.last().map(|s| s.end).unwrap_or(0.0);
    let summary = format!(
        "Automatic analysis was unavailable for this video. The transcript contains {} \
         subtitle segments spanning {}; representative excerpts are listed below.",
        segments.len(),
        display_time(end),
    );

    let mut indices = vec![0, segments.len() / 2, segments.len() - 1];
    indices.dedup();

    let key_points = indices
        .into_iter()
        .map(|i| {
            let seg = &segments[i];
            KeyPoint {
                point: format!("Excerpt at {}", display_time(seg.start)),
                explanation: seg.text.clone(),
                timestamp: seg.start.max(0.0),
                quote: Some(seg.text.clone()),
            }
        })
        .collect();

    Analysis {
        summary,
        key_points,
    }
}
