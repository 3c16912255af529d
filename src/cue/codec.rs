use super::timestamp::{format_timestamp, from_millis, parse_timestamp, to_millis};
use crate::error::{IngestError, Result};
use crate::tools::write_atomic;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

pub const HEADER: &str = "WEBVTT";

/// Display length of a marker cue.
pub const MARKER_DURATION: f64 = 20.0;

/// Display length of the last chapter cue.
pub const CHAPTER_TAIL: f64 = 10.0;

/// One time-coded entry. The start is held at millisecond precision, the same
/// precision the text format carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    start: f64,
    label: String,
}

impl Cue {
    /// Builds a cue, truncating `start` to whole milliseconds (negatives clamp
    /// to zero) and folding the label onto a single trimmed line.
    #[must_use]
    pub fn new(start: f64, label: impl AsRef<str>) -> Self {
        let label = label
            .as_ref()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            start: from_millis(to_millis(start)),
            label,
        }
    }

    #[must_use]
    pub const fn start(&self) -> f64 {
        self.start
    }

    #[must_use]
    pub fn start_millis(&self) -> u64 {
        to_millis(self.start)
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether this cue has the same `(start, label)` identity as `other`.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.start_millis() == other.start_millis() && self.label == other.label
    }
}

/// Rejects labels that cannot be written as a single cue text line.
pub fn validate_label(cue: &Cue) -> Result<()> {
    if cue.label.is_empty() {
        return Err(IngestError::format(0, "cue label is empty"));
    }
    if cue.label.contains("-->") {
        return Err(IngestError::format(0, "cue label must not contain \"-->\""));
    }
    Ok(())
}

/// How the end of each cue is derived when writing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EndRule {
    /// `end = start + duration`.
    Fixed(f64),
    /// `end` is the next cue's start; the last cue gets `start + tail`.
    UntilNext { tail: f64 },
}

impl EndRule {
    pub const MARKERS: Self = Self::Fixed(MARKER_DURATION);
    pub const CHAPTERS: Self = Self::UntilNext { tail: CHAPTER_TAIL };
}

/// Sorts ascending by start (stable) and drops repeated `(start, label)` pairs.
#[must_use]
pub fn normalize(mut cues: Vec<Cue>) -> Vec<Cue> {
    cues.sort_by(|a, b| a.start.total_cmp(&b.start));
    let mut seen = HashSet::new();
    cues.retain(|cue| seen.insert((cue.start_millis(), cue.label.clone())));
    cues
}

/// Serializes cues. Output is always in ascending start order with duplicates
/// removed, whatever order the input was in.
#[must_use]
pub fn encode(cues: &[Cue], end_rule: EndRule) -> String {
    let cues = normalize(cues.to_vec());

    let mut text = String::with_capacity(16 + cues.len() * 48);
    text.push_str(HEADER);
    text.push_str("\n\n");

    for (i, cue) in cues.iter().enumerate() {
        let end = match end_rule {
            EndRule::Fixed(duration) => cue.start + duration,
            EndRule::UntilNext { tail } => cues
                .get(i + 1)
                .map_or(cue.start + tail, |next| next.start),
        };

        text.push_str(&format_timestamp(cue.start));
        text.push_str(" --> ");
        text.push_str(&format_timestamp(end));
        text.push('\n');
        text.push_str(&cue.label);
        text.push_str("\n\n");
    }

    text
}

/// Scanner states of the decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanState {
    Header,
    ExpectTiming,
    ExpectLabel { start: f64, timing_line: usize },
}

impl ScanState {
    /// Consumes one non-blank, trimmed line.
    fn next(self, line: &str, line_no: usize, cues: &mut Vec<Cue>) -> Result<Self> {
        match self {
            Self::Header => {
                let line = line.trim_start_matches('\u{feff}');
                if line == HEADER || line.starts_with("WEBVTT ") || line.starts_with("WEBVTT\t") {
                    Ok(Self::ExpectTiming)
                } else {
                    Err(IngestError::format(line_no, "missing WEBVTT header"))
                }
            }
            Self::ExpectTiming => {
                let Some((start, end)) = line.split_once("-->") else {
                    // Cue identifiers and comments.
                    return Ok(Self::ExpectTiming);
                };
                let start = parse_timestamp(start)
                    .map_err(|e| IngestError::format(line_no, e.to_string()))?;
                let end = end.split_whitespace().next().unwrap_or_default();
                parse_timestamp(end).map_err(|e| IngestError::format(line_no, e.to_string()))?;
                Ok(Self::ExpectLabel {
                    start,
                    timing_line: line_no,
                })
            }
            Self::ExpectLabel { start, .. } => {
                if line.contains("-->") {
                    return Err(IngestError::format(
                        line_no,
                        "timing line where a cue label was expected",
                    ));
                }
                cues.push(Cue::new(start, line));
                Ok(Self::ExpectTiming)
            }
        }
    }
}

/// Parses cue-sheet text. Blank input yields no cues.
pub fn decode(text: &str) -> Result<Vec<Cue>> {
    let mut cues = Vec::new();
    let mut state = ScanState::Header;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        state = state.next(line, index + 1, &mut cues)?;
    }

    if let ScanState::ExpectLabel { timing_line, .. } = state {
        return Err(IngestError::format(timing_line, "cue has no label"));
    }

    Ok(cues)
}

/// Reads and decodes a cue file. A missing file means "no cues yet".
pub fn read_cue_file(path: &Path) -> Result<Vec<Cue>> {
    match fs::read_to_string(path) {
        Ok(text) => decode(&text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(IngestError::io(path, e)),
    }
}

/// Encodes and atomically writes a cue file, returning the cues as written.
pub fn write_cue_file(path: &Path, cues: Vec<Cue>, end_rule: EndRule) -> Result<Vec<Cue>> {
    let cues = normalize(cues);
    write_atomic(path, encode(&cues, end_rule).as_bytes())?;
    Ok(cues)
}
