//! Re-flows one answer into platform-sized message fragments.
//!
//! Lengths are counted in Unicode scalar values and every cut lands on a
//! character boundary.

use serde::Serialize;

use crate::{ChunkPolicy, PlatformProfile, parse::PARAGRAPH_BREAK};

/// Label prefixed to paragraphs after the first under the paragraph policy.
pub const CONTINUATION_LABEL: &str = "(cont.) ";

/// Sentence terminator searched for when choosing a breakpoint.
const SENTENCE_BREAK: &str = ". ";

/// One platform-ready message chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_label: Option<String>,
}

impl Fragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            part_label: None,
        }
    }

    pub fn labeled(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            part_label: Some(label.into()),
        }
    }

    /// The message as delivered: label (if any) followed by the text.
    pub fn rendered(&self) -> String {
        match &self.part_label {
            Some(label) => format!("{label}{}", self.text),
            None => self.text.clone(),
        }
    }
}

/// Split `answer` into fragments for `profile`, with `header` leading the
/// first message.
pub fn chunk(answer: &str, profile: &PlatformProfile, header: &str) -> Vec<Fragment> {
    match profile.policy() {
        ChunkPolicy::Paragraph => chunk_paragraphs(answer, header),
        ChunkPolicy::LengthBounded => chunk_bounded(answer, profile, header),
    }
}

fn chunk_paragraphs(answer: &str, header: &str) -> Vec<Fragment> {
    let mut paragraphs = answer
        .split(PARAGRAPH_BREAK)
        .filter(|p| !p.trim().is_empty());
    let first = paragraphs.next().unwrap_or(answer);
    let mut fragments = vec![Fragment::new(format!("{header}\n\nAnswer: {first}"))];
    fragments.extend(paragraphs.map(|p| Fragment::labeled(CONTINUATION_LABEL, p)));
    fragments
}

fn chunk_bounded(answer: &str, profile: &PlatformProfile, header: &str) -> Vec<Fragment> {
    let full = format!("{header}\n\nAnswer: {answer}");
    if char_len(&full) <= profile.max_message_length() {
        return vec![Fragment::new(full)];
    }

    // The part-1 notice is bounded too; a long question spills over several
    // unlabelled messages.
    let notice = format!("{header}\n\nAnswer (part 1):");
    let mut fragments: Vec<Fragment> = split_bounded(
        &notice,
        profile.max_message_length(),
        profile.breakpoint_min_fraction(),
    )
    .into_iter()
    .map(|piece| Fragment::new(piece.trim_end()))
    .collect();
    fragments.extend(
        split_bounded(
            answer,
            profile.budget(),
            profile.breakpoint_min_fraction(),
        )
        .into_iter()
        .enumerate()
        .map(|(i, text)| match i {
            0 => Fragment::new(text),
            _ => Fragment::labeled(part_label(i + 1), text),
        }),
    );
    fragments
}

/// Label prefixed to answer part `part` (1-based) under the length-bounded
/// policy.
pub fn part_label(part: usize) -> String {
    format!("Answer (part {part}): ")
}

/// Cut `text` into pieces of at most `budget` characters.
///
/// Each piece prefers to end at the last sentence break or newline in its
/// window, provided that break sits at or beyond `min_fraction * budget`.
/// Whitespace between pieces is skipped.
fn split_bounded(text: &str, budget: usize, min_fraction: f64) -> Vec<&str> {
    let budget = budget.max(1);
    let min_offset = min_fraction * budget as f64;
    let mut pieces = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let window_end = byte_offset(remaining, budget);
        let cut = if window_end < remaining.len() {
            find_breakpoint(&remaining[..window_end], min_offset).unwrap_or(window_end)
        } else {
            window_end
        };

        pieces.push(&remaining[..cut]);
        remaining = remaining[cut..].trim_start();
    }

    pieces
}

/// Byte offset of the `n`-th character, or the end of `s`.
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Latest acceptable cut inside `window`: just after a `". "` period or just
/// before a newline, whichever is later.
fn find_breakpoint(window: &str, min_offset: f64) -> Option<usize> {
    let sentence = window.rfind(SENTENCE_BREAK).map(|i| i + 1);
    let newline = window.rfind('\n');
    let cut = sentence.max(newline).filter(|cut| *cut > 0)?;
    (char_len(&window[..cut]) as f64 >= min_offset).then_some(cut)
}
