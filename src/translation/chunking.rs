/*!
 * Splitting oversized text into overlapping chunks and stitching the
 * translated chunks back together.
 *
 * All sizes are counted in characters (Unicode scalar values). A chunk is
 * cut at the last paragraph break past half of its window, else at the last
 * sentence end past a third of it, else at the window boundary. The next
 * window starts `overlap_size` characters before the cut.
 *
 * Merging removes the duplicated overlap with a largest-first probe that
 * compares the accumulator's tail to the next chunk's head position by
 * position. This is a cheap approximation, not an alignment: repeated
 * substrings can produce false matches.
 */

use log::{debug, warn};

use crate::app_config::ChunkingConfig;
use crate::errors::TranslationError;

/// Upper bound for the merge probe
const MAX_MERGE_PROBE: usize = 200;
/// Smallest overlap the merge probe considers
const MIN_MERGE_PROBE: usize = 10;
/// Probe step
const MERGE_PROBE_STEP: usize = 10;

/// Characters that end a sentence when followed by whitespace
const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '\u{0964}', '\u{0965}', '\u{3002}'];

/// A slice of the input text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk text, including the leading overlap
    pub text: String,
    /// Position in the chunk sequence
    pub index: usize,
    /// Leading characters shared with the previous chunk
    pub overlap: usize,
}

impl Chunk {
    /// Number of characters in the chunk
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The chunk text without its leading overlap
    pub fn fresh_text(&self) -> String {
        self.text.chars().skip(self.overlap).collect()
    }
}

/// Overlaps found while merging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Characters dropped from the head of each chunk after the first
    pub detected_overlaps: Vec<usize>,
}

impl MergeReport {
    /// Total characters removed as overlap
    pub fn total_removed(&self) -> usize {
        self.detected_overlaps.iter().sum()
    }

    /// Indices of chunks that declared an overlap the merge could not find
    pub fn missed_overlaps(&self, chunks: &[Chunk]) -> Vec<usize> {
        chunks
            .iter()
            .skip(1)
            .zip(self.detected_overlaps.iter())
            .filter(|(chunk, detected)| chunk.overlap > 0 && **detected == 0)
            .map(|(chunk, _)| chunk.index)
            .collect()
    }
}

/// Splits and merges text around a maximum chunk size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextChunker {
    max_chunk_size: usize,
    overlap_size: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(1500, 200)
    }
}

impl TextChunker {
    pub fn new(max_chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
            overlap_size,
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.max_chunk_size, config.overlap_size)
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn overlap_size(&self) -> usize {
        self.overlap_size
    }

    /// Whether `text` is long enough to be split
    pub fn needs_split(&self, text: &str) -> bool {
        text.chars().count() > self.max_chunk_size
    }

    /// Split `text` into overlapping chunks
    ///
    /// Text at or under the maximum size comes back as a single chunk equal
    /// to the input. Concatenating every chunk's `fresh_text` reproduces the
    /// input exactly.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        if total <= self.max_chunk_size {
            return vec![Chunk {
                text: text.to_string(),
                index: 0,
                overlap: 0,
            }];
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut previous_end: usize = 0;

        loop {
            let window_end = (start + self.max_chunk_size).min(total);
            let end = if window_end == total {
                total
            } else {
                find_cut(&chars[start..window_end]) + start
            };

            chunks.push(Chunk {
                text: chars[start..end].iter().collect(),
                index: chunks.len(),
                overlap: previous_end.saturating_sub(start),
            });

            if end >= total {
                break;
            }

            previous_end = end;
            let retreat = end.saturating_sub(self.overlap_size);
            // Always move forward, even if the overlap would swallow the chunk
            start = if retreat > start { retreat } else { end };
        }

        debug!(
            "Split {} characters into {} chunks (max {}, overlap {})",
            total,
            chunks.len(),
            self.max_chunk_size,
            self.overlap_size
        );
        chunks
    }

    /// Merge translated chunks, dropping detected overlaps
    pub fn merge(&self, translated: &[String], overlap_threshold: f32) -> String {
        self.merge_with_report(translated, overlap_threshold).0
    }

    /// Merge translated chunks and report the overlap removed from each
    pub fn merge_with_report(&self, translated: &[String], overlap_threshold: f32) -> (String, MergeReport) {
        let mut report = MergeReport::default();
        let Some((first, rest)) = translated.split_first() else {
            return (String::new(), report);
        };

        let mut accumulator: Vec<char> = first.chars().collect();
        for chunk in rest {
            let next: Vec<char> = chunk.chars().collect();
            let overlap = detect_overlap(&accumulator, &next, overlap_threshold);
            accumulator.extend_from_slice(&next[overlap..]);
            report.detected_overlaps.push(overlap);
        }

        (accumulator.into_iter().collect(), report)
    }

    /// Merge and log chunks whose declared overlap was not found
    pub fn merge_chunks(&self, chunks: &[Chunk], translated: &[String], overlap_threshold: f32) -> String {
        let (merged, report) = self.merge_with_report(translated, overlap_threshold);
        let missed = report.missed_overlaps(chunks);
        if !missed.is_empty() {
            let error = TranslationError::ChunkMerge(format!(
                "no overlap detected for chunks {:?}; text may contain duplicated passages",
                missed
            ));
            warn!("{}", error);
        }
        merged
    }
}

/// Cut position inside `window`, which is a full `max_chunk_size` window
fn find_cut(window: &[char]) -> usize {
    let len = window.len();

    // Last paragraph break past half of the window
    if let Some(pos) = (0..len.saturating_sub(1))
        .rev()
        .find(|&i| window[i] == '\n' && window[i + 1] == '\n')
    {
        if pos > len / 2 {
            return pos + 2;
        }
    }

    // Last sentence end past a third of the window
    if let Some(pos) = (0..len.saturating_sub(1))
        .rev()
        .find(|&i| SENTENCE_TERMINATORS.contains(&window[i]) && window[i + 1].is_whitespace())
    {
        if pos > len / 3 {
            return pos + 2;
        }
    }

    len
}

/// Largest probed length whose tail/head match ratio meets `threshold`
fn detect_overlap(accumulator: &[char], next: &[char], threshold: f32) -> usize {
    let max_probe = MAX_MERGE_PROBE.min(next.len() / 3).min(accumulator.len());
    let mut candidate = max_probe;

    while candidate >= MIN_MERGE_PROBE {
        let tail = &accumulator[accumulator.len() - candidate..];
        let head = &next[..candidate];
        if match_ratio(tail, head) >= threshold {
            return candidate;
        }
        candidate -= MERGE_PROBE_STEP;
    }

    0
}

/// Share of positions holding the same character
fn match_ratio(a: &[char], b: &[char]) -> f32 {
    if a.is_empty() {
        return 0.0;
    }
    let matches = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    matches as f32 / a.len() as f32
}
