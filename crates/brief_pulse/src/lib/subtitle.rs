//! # Subtitle Engine
//!
//! Turns raw recognizer segments, which are chopped at pause boundaries, into
//! sentence-scale subtitle units via a sentence-completeness heuristic, and
//! renders/parses the SRT artifact the transcribe stage persists.

use crate::TranscribeSegment;

/// A merged, sentence-scale transcript unit.
///
/// `sources` keeps the raw segments absorbed into this unit, in order; the
/// quote matcher uses them for finer-grained timestamp recovery. Merged
/// segments never overlap; gaps between them are permitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub sources: Vec<TranscribeSegment>,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Tunables for the merge heuristic. The score constants are empirical;
/// they are carried as-is rather than re-derived.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Preferred duration of a merged unit, seconds.
    pub target_duration: f64,
    /// Hard ceiling on a merged unit's duration, seconds.
    pub max_duration: f64,
    /// Largest silence between raw segments that still allows merging.
    pub max_gap: f64,
    /// Completeness score at or above which a unit can stand alone.
    pub complete_score: i32,
    /// How much a concatenation must out-score the current text to justify
    /// merging an already-complete unit.
    pub improvement_margin: i32,
    /// Units shorter than this always try to absorb their neighbor.
    pub min_standalone: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig {
            target_duration: 25.0,
            max_duration: 45.0,
            max_gap: 2.0,
            complete_score: 8,
            improvement_margin: 3,
            min_standalone: 8.0,
        }
    }
}

const TERMINAL_MARKS: &[char] = &['。', '！', '？', '…', '.', '!', '?'];
const SOFT_PAUSE_MARKS: &[char] = &['，', '、', '；', '：', ',', ';', ':'];

const TERMINAL_SCORE: i32 = 10;
const SOFT_PAUSE_SCORE: i32 = 5;
const NATURAL_LENGTH_SCORE: i32 = 3;
const FRAGMENT_PENALTY: i32 = 5;

/// Character band considered a natural spoken utterance length.
const NATURAL_LENGTH_BAND: std::ops::RangeInclusive<usize> = 20..=80;
const FRAGMENT_LENGTH: usize = 10;

/// Heuristic sentence-completeness score of a text.
pub fn completeness_score(text: &str) -> i32 {
    let trimmed = text.trim();
    let mut score = 0;

    match trimmed.chars().last() {
        Some(c) if TERMINAL_MARKS.contains(&c) => score += TERMINAL_SCORE,
        Some(c) if SOFT_PAUSE_MARKS.contains(&c) => score += SOFT_PAUSE_SCORE,
        _ => {}
    }

    let len = trimmed.chars().count();
    if len < FRAGMENT_LENGTH {
        score -= FRAGMENT_PENALTY;
    } else if NATURAL_LENGTH_BAND.contains(&len) {
        score += NATURAL_LENGTH_SCORE;
    }

    score
}

fn ends_terminal(text: &str) -> bool {
    text.trim_end()
        .chars()
        .last()
        .is_some_and(|c| TERMINAL_MARKS.contains(&c))
}

pub(crate) fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'   // hiragana + katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{AC00}'..='\u{D7AF}' // hangul syllables
        | '\u{F900}'..='\u{FAFF}' // CJK compatibility ideographs
        | '\u{3000}'..='\u{303F}' // CJK punctuation
        | '\u{FF00}'..='\u{FFEF}' // fullwidth forms
    )
}

/// Join two segment texts. CJK text is concatenated directly; Latin text gets
/// a single separating space.
fn join_texts(left: &str, right: &str) -> String {
    let needs_space = !left.chars().last().is_some_and(is_cjk)
        && !right.chars().next().is_some_and(is_cjk);
    if needs_space {
        format!("{left} {right}")
    } else {
        format!("{left}{right}")
    }
}

/// Merge raw recognizer segments into sentence-scale units.
///
/// Raw segments are consumed in order; for each one the accumulator either
/// absorbs it or is emitted and restarted, based on gap, duration and the
/// completeness score. Whitespace-only raw segments are dropped.
#[tracing::instrument(skip_all, fields(raw_count = raw.len()))]
pub fn merge(raw: &[TranscribeSegment], config: &MergeConfig) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::new();
    let mut current: Option<Segment> = None;

    for seg in raw {
        let text = seg.text.trim();
        if text.is_empty() {
            continue;
        }

        let Some(cur) = current.as_mut() else {
            current = Some(begin_unit(seg, merged.last().map(|m| m.end)));
            continue;
        };

        let gap = seg.start - cur.end;
        let combined_duration = seg.end - cur.start;
        let cur_score = completeness_score(&cur.text);
        let cur_duration = cur.duration();
        let candidate = join_texts(&cur.text, text);

        let should_merge = gap <= config.max_gap
            && combined_duration <= config.max_duration
            && (cur_score < config.complete_score
                || completeness_score(&candidate) > cur_score + config.improvement_margin
                || cur_duration < config.min_standalone
                || (cur_duration < config.target_duration && !ends_terminal(&cur.text)));

        if should_merge {
            cur.text = candidate;
            cur.end = cur.end.max(seg.end);
            cur.sources.push(seg.clone());
        } else {
            let done = current.take().expect("accumulator is present");
            let prev_end = done.end;
            merged.push(done);
            current = Some(begin_unit(seg, Some(prev_end)));
        }
    }

    if let Some(cur) = current {
        merged.push(cur);
    }

    tracing::debug!(merged_count = merged.len(), "Merged raw segments");
    merged
}

/// Start a new accumulator from a raw segment, clamping its start so emitted
/// units never overlap even when the recognizer produced sloppy boundaries.
fn begin_unit(seg: &TranscribeSegment, prev_end: Option<f64>) -> Segment {
    let start = prev_end.map_or(seg.start, |e| seg.start.max(e));
    Segment {
        start,
        end: seg.end.max(start),
        text: seg.text.trim().to_string(),
        sources: vec![seg.clone()],
    }
}

/// Render segments as an SRT document.
pub fn to_srt(segments: &[Segment]) -> String {
    let mut srt = String::new();
    for (i, seg) in segments.iter().enumerate() {
        srt.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            srt_timestamp(seg.start),
            srt_timestamp(seg.end),
            seg.text
        ));
    }
    srt
}

/// Parse an SRT document back into segments. Round-trips `to_srt` output;
/// parsed segments carry no pre-merge sources.
pub fn parse_srt(srt: &str) -> Vec<Segment> {
    let mut segments = Vec::new();

    for block in srt.split("\n\n").map(str::trim).filter(|b| !b.is_empty()) {
        let mut lines = block.lines();
        // index line
        if lines.next().is_none() {
            continue;
        }
        let Some((start, end)) = lines.next().and_then(parse_srt_time_range) else {
            continue;
        };
        let text = lines.collect::<Vec<_>>().join("\n");
        if text.is_empty() {
            continue;
        }
        segments.push(Segment {
            start,
            end,
            text,
            sources: Vec::new(),
        });
    }

    segments
}

/// Join all segment texts into the plain transcript artifact.
pub fn plain_text(segments: &[Segment]) -> String {
    segments.iter().fold(String::new(), |acc, seg| {
        if acc.is_empty() {
            seg.text.clone()
        } else {
            join_texts(&acc, &seg.text)
        }
    })
}

/// Compact `MM:SS` / `HH:MM:SS` form used in reports and log lines.
pub fn display_time(seconds: f64) -> String {
    let hours = (seconds / 3600.0) as u64;
    let minutes = ((seconds % 3600.0) / 60.0) as u64;
    let secs = (seconds % 60.0) as u64;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

fn srt_timestamp(seconds: f64) -> String {
    let hours = (seconds / 3600.0) as u64;
    let minutes = ((seconds % 3600.0) / 60.0) as u64;
    let secs = (seconds % 60.0) as u64;
    let millis = ((seconds % 1.0) * 1000.0) as u64;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

fn parse_srt_time_range(line: &str) -> Option<(f64, f64)> {
    let (start, end) = line.split_once(" --> ")?;
    Some((parse_srt_timestamp(start)?, parse_srt_timestamp(end)?))
}

fn parse_srt_timestamp(ts: &str) -> Option<f64> {
    let (hms, millis) = ts.trim().split_once(',')?;
    let parts: Vec<u64> = hms.split(':').filter_map(|p| p.parse().ok()).collect();
    let &[hours, minutes, secs] = parts.as_slice() else {
        return None;
    };
    let millis: u64 = millis.parse().ok()?;
    Some((hours * 3600 + minutes * 60 + secs) as f64 + millis as f64 / 1000.0)
}
