//! # Chunk Planner
//!
//! Splits transcripts that do not fit one completion call into
//! context-budget-sized chunks. Token counts are estimated from character
//! counts with a language-aware multiplier; the estimate only decides
//! whether chunking happens at all, the split itself works in characters.

use crate::subtitle::{is_cjk, Segment};

/// A bounded-size transcript slice plus the segments anchored inside it.
/// Ephemeral: lives only within one analyze pass.
#[derive(Debug, Clone)]
pub struct AnalysisChunk {
    pub text: String,
    pub segments: Vec<Segment>,
}

/// CJK text runs ~1.5 tokens per character.
const CJK_TOKENS_PER_CHAR: f64 = 1.5;
/// Latin text approximates 4 characters per token.
const LATIN_CHARS_PER_TOKEN: usize = 4;
/// Share of non-whitespace CJK characters above which the CJK rate applies.
const CJK_DOMINANCE: f64 = 0.3;
/// Tokens held back from the budget for the prompt template itself.
pub const PROMPT_RESERVE_TOKENS: usize = 2_000;
/// Leading characters of a segment used to anchor it inside a chunk.
const SEGMENT_ANCHOR_CHARS: usize = 12;

/// Delimiter classes tried in priority order when splitting.
const SENTENCE_MARKS: &[char] = &['。', '！', '？', '.', '!', '?'];

/// Estimate the token count of `text`.
pub fn estimate_tokens(text: &str) -> usize {
    let chars = text.chars().count();
    if chars == 0 {
        return 0;
    }
    if is_cjk_dominant(text) {
        (chars as f64 * CJK_TOKENS_PER_CHAR).ceil() as usize
    } else {
        chars.div_ceil(LATIN_CHARS_PER_TOKEN)
    }
}

fn is_cjk_dominant(text: &str) -> bool {
    let mut total = 0usize;
    let mut cjk = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if is_cjk(c) {
            cjk += 1;
        }
    }
    total > 0 && cjk as f64 / total as f64 >= CJK_DOMINANCE
}

/// Plan analysis chunks for `text` under `max_input_budget` tokens.
///
/// Concatenating the returned chunk texts in order reproduces `text`
/// exactly; no character is ever dropped or truncated.
#[tracing::instrument(skip(text, segments), fields(transcript_chars = text.chars().count()))]
pub fn plan(text: &str, segments: &[Segment], max_input_budget: usize) -> Vec<AnalysisChunk> {
    let available = max_input_budget.saturating_sub(PROMPT_RESERVE_TOKENS);

    if estimate_tokens(text) <= available {
        return vec![AnalysisChunk {
            text: text.to_string(),
            segments: segments.to_vec(),
        }];
    }

    let char_budget = chars_for_budget(text, available);
    let pieces = split_pieces(text, char_budget);

    let mut chunk_texts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for piece in pieces {
        let piece_chars = piece.chars().count();

        if current_chars + piece_chars > char_budget && !current.is_empty() {
            chunk_texts.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if piece_chars > char_budget {
            // a single indivisible piece over budget: force-split by raw
            // character slicing rather than dropping anything
            chunk_texts.extend(char_slices(&piece, char_budget));
        } else {
            current.push_str(&piece);
            current_chars += piece_chars;
        }
    }
    if !current.is_empty() {
        chunk_texts.push(current);
    }

    tracing::debug!(chunks = chunk_texts.len(), char_budget, "Planned analysis chunks");

    chunk_texts
        .into_iter()
        .map(|text| {
            let segments = segments
                .iter()
                .filter(|seg| text.contains(segment_anchor(seg)))
                .cloned()
                .collect();
            AnalysisChunk { text, segments }
        })
        .collect()
}

/// Per-chunk character budget equivalent to `available` tokens.
fn chars_for_budget(text: &str, available: usize) -> usize {
    let chars = if is_cjk_dominant(text) {
        (available as f64 / CJK_TOKENS_PER_CHAR).floor() as usize
    } else {
        available * LATIN_CHARS_PER_TOKEN
    };
    chars.max(1)
}

/// Split on the first delimiter class that actually divides the text,
/// keeping each delimiter attached to its piece. Falls back to fixed-size
/// character slices when no class divides the text at all.
fn split_pieces(text: &str, char_budget: usize) -> Vec<String> {
    let by_sentence: Vec<String> = text
        .split_inclusive(|c| SENTENCE_MARKS.contains(&c))
        .map(str::to_string)
        .collect();
    if by_sentence.len() > 1 {
        return by_sentence;
    }

    let by_newline: Vec<String> = text.split_inclusive('\n').map(str::to_string).collect();
    if by_newline.len() > 1 {
        return by_newline;
    }

    let by_space: Vec<String> = text.split_inclusive(' ').map(str::to_string).collect();
    if by_space.len() > 1 {
        return by_space;
    }

    char_slices(text, char_budget)
}

fn char_slices(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

fn segment_anchor(seg: &Segment) -> &str {
    let trimmed = seg.text.trim();
    match trimmed.char_indices().nth(SEGMENT_ANCHOR_CHARS) {
        Some((byte_idx, _)) => &trimmed[..byte_idx],
        None => trimmed,
    }
}
