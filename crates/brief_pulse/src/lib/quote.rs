//! # Quote-to-Timestamp Matcher
//!
//! LLM-produced quotes are paraphrased, truncated or reordered relative to
//! the source segments, so no single matching strategy suffices. Resolution
//! runs through tiers that trade precision for robustness; each tier is
//! attempted only when the previous one fails.

use std::collections::HashSet;

use crate::subtitle::{is_cjk, Segment};

/// Minimum Jaccard word overlap accepted by the word-overlap tier.
const WORD_OVERLAP_MIN: f64 = 0.20;
/// Minimum combined first/last-words score accepted by the boundary tier.
const BOUNDARY_OVERLAP_MIN: f64 = 0.15;
/// Minimum share of probe words found accepted by the positional tier.
const POSITIONAL_HIT_MIN: f64 = 0.25;
/// Characters around a segment's transcript span searched positionally.
const POSITIONAL_WINDOW_CHARS: usize = 100;
/// Leading meaningful quote words used as the positional probe.
const POSITIONAL_PROBE_WORDS: usize = 8;
/// Words taken from each end for boundary matching.
const BOUNDARY_WORDS: usize = 3;

/// Resolve the segment a quote most plausibly came from.
///
/// Returns `None` only for an empty segment list; otherwise some segment is
/// always produced, falling back to the temporal midpoint of non-zero-start
/// segments rather than clustering unmatched quotes at t=0.
pub fn match_segment<'a>(quote: &str, segments: &'a [Segment]) -> Option<&'a Segment> {
    if segments.is_empty() {
        return None;
    }

    let cleaned = clean(quote);
    if cleaned.is_empty() {
        return fallback(segments);
    }

    exact_substring(&cleaned, segments)
        .or_else(|| word_overlap(quote, segments))
        .or_else(|| boundary_overlap(quote, segments))
        .or_else(|| positional_estimate(quote, segments))
        .or_else(|| fallback(segments))
}

/// Tier 1: punctuation-stripped, case-folded substring match in either
/// direction. Highest confidence; first hit wins.
fn exact_substring<'a>(cleaned_quote: &str, segments: &'a [Segment]) -> Option<&'a Segment> {
    segments.iter().find(|seg| {
        let seg_clean = clean(&seg.text);
        !seg_clean.is_empty()
            && (seg_clean.contains(cleaned_quote) || cleaned_quote.contains(&seg_clean))
    })
}

/// Tier 2: Jaccard overlap over word sets. A merged segment is scored
/// through its pre-merge originals when present, for finer resolution.
fn word_overlap<'a>(quote: &str, segments: &'a [Segment]) -> Option<&'a Segment> {
    let quote_words: HashSet<String> = tokenize(quote).into_iter().collect();
    if quote_words.is_empty() {
        return None;
    }

    let mut best: Option<(&Segment, f64)> = None;
    for seg in segments {
        let score = if seg.sources.is_empty() {
            jaccard(&quote_words, &tokenize(&seg.text).into_iter().collect())
        } else {
            seg.sources
                .iter()
                .map(|src| jaccard(&quote_words, &tokenize(&src.text).into_iter().collect()))
                .fold(0.0, f64::max)
        };

        if best.is_none_or(|(_, b)| score > b) {
            best = Some((seg, score));
        }
    }

    best.filter(|&(_, score)| score >= WORD_OVERLAP_MIN)
        .map(|(seg, _)| seg)
}

/// Tier 3: partial boundary match on the first/last few words.
fn boundary_overlap<'a>(quote: &str, segments: &'a [Segment]) -> Option<&'a Segment> {
    let quote_words = tokenize(quote);
    if quote_words.is_empty() {
        return None;
    }
    let q_head = edge_words(&quote_words, true);
    let q_tail = edge_words(&quote_words, false);

    let mut best: Option<(&Segment, f64)> = None;
    for seg in segments {
        let seg_words = tokenize(&seg.text);
        if seg_words.is_empty() {
            continue;
        }
        let hits = intersection_count(&q_head, &edge_words(&seg_words, true))
            + intersection_count(&q_tail, &edge_words(&seg_words, false));
        let score = hits as f64 / (BOUNDARY_WORDS * 2) as f64;

        if best.is_none_or(|(_, b)| score > b) {
            best = Some((seg, score));
        }
    }

    best.filter(|&(_, score)| score >= BOUNDARY_OVERLAP_MIN)
        .map(|(seg, _)| seg)
}

/// Tier 4: positional estimation over the reconstructed transcript. The
/// quote's leading meaningful words are counted inside each segment's local
/// window of the full text.
fn positional_estimate<'a>(quote: &str, segments: &'a [Segment]) -> Option<&'a Segment> {
    let probe: Vec<String> = tokenize(quote)
        .into_iter()
        .filter(|w| w.chars().count() > 1 || w.chars().all(is_cjk))
        .take(POSITIONAL_PROBE_WORDS)
        .collect();
    if probe.is_empty() {
        return None;
    }

    // offset map of each segment's span inside the concatenated transcript
    let mut full: Vec<char> = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::with_capacity(segments.len());
    for seg in segments {
        let start = full.len();
        full.extend(clean(&seg.text).chars());
        spans.push((start, full.len()));
        full.push(' ');
    }

    let mut best: Option<(&Segment, f64)> = None;
    for (seg, &(start, end)) in segments.iter().zip(&spans) {
        let lo = start.saturating_sub(POSITIONAL_WINDOW_CHARS);
        let hi = (end + POSITIONAL_WINDOW_CHARS).min(full.len());
        let window: String = full[lo..hi].iter().collect();

        let found = probe.iter().filter(|w| window.contains(w.as_str())).count();
        let score = found as f64 / probe.len() as f64;

        if best.is_none_or(|(_, b)| score > b) {
            best = Some((seg, score));
        }
    }

    best.filter(|&(_, score)| score >= POSITIONAL_HIT_MIN)
        .map(|(seg, _)| seg)
}

/// Tier 5: temporal midpoint of the non-zero-start segments. Defaulting to
/// the first segment would cluster every unmatched quote at t=0.
fn fallback(segments: &[Segment]) -> Option<&Segment> {
    let non_zero: Vec<&Segment> = segments.iter().filter(|s| s.start > 0.0).collect();
    match non_zero.as_slice() {
        [] => segments.first(),
        nz => Some(nz[nz.len() / 2]),
    }
}

/// Lowercase and strip everything but letters, digits and single spaces.
fn clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Split into comparable word tokens: lowercased alphanumeric runs for
/// alphabetic scripts, one token per CJK character.
fn tokenize(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if is_cjk(c) && c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            words.push(c.to_string());
        } else if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

fn edge_words(words: &[String], head: bool) -> Vec<&String> {
    if head {
        words.iter().take(BOUNDARY_WORDS).collect()
    } else {
        words.iter().rev().take(BOUNDARY_WORDS).collect()
    }
}

fn intersection_count(a: &[&String], b: &[&String]) -> usize {
    a.iter().filter(|w| b.contains(w)).count()
}
