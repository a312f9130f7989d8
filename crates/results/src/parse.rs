//! Reads a result block into ordered question/answer records.
//!
//! Grammar, one group per `---`-separated segment:
//!
//! ```text
//! group    := line*
//! line     := question | answer | blank | text
//! question := "QUESTION_" n ":::" value
//! answer   := "ANSWER_" n ":::" value
//! ```
//!
//! `n` is a positive decimal integer. Lines are classified first and then fed
//! through a two-state machine (`Seeking`, `InAnswer`), so the accepted
//! grammar lives in [`classify`] and [`GroupBuilder::feed`] and nowhere else.

use {
    serde::Serialize,
    tracing::{debug, warn},
};

use crate::ResultBlock;

/// Line that separates two record groups.
const GROUP_SEPARATOR: &str = "---";

/// Token between a tag and its value.
const FIELD_SEPARATOR: &str = ":::";

const QUESTION_TAG: &str = "QUESTION_";
const ANSWER_TAG: &str = "ANSWER_";

/// Separator used when joining answer paragraphs.
pub(crate) const PARAGRAPH_BREAK: &str = "\n\n";

/// One parsed question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Declared 1-based position; diagnostic only, never used for ordering.
    pub index: u32,
    pub question: String,
    /// Paragraphs joined with a blank line.
    pub answer: String,
}

impl Record {
    /// The answer split back into its paragraphs.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.answer.split(PARAGRAPH_BREAK)
    }
}

/// A single classified line of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Question { index: u32, text: &'a str },
    Answer { index: u32, text: &'a str },
    Blank,
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    if let Some((index, text)) = tagged(line, QUESTION_TAG) {
        return Line::Question { index, text };
    }
    if let Some((index, text)) = tagged(line, ANSWER_TAG) {
        return Line::Answer { index, text };
    }
    Line::Text(line)
}

/// Match `<tag><n>:::<value>` and return `(n, trimmed value)`.
fn tagged<'a>(line: &'a str, tag: &str) -> Option<(u32, &'a str)> {
    let rest = line.strip_prefix(tag)?;
    let (digits, value) = rest.split_once(FIELD_SEPARATOR)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = digits.parse::<u32>().ok().filter(|n| *n > 0)?;
    Some((index, value.trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Seeking,
    InAnswer,
}

/// Accumulates one group's lines into at most one record.
#[derive(Debug)]
struct GroupBuilder<'a> {
    state: State,
    question: Option<(u32, &'a str)>,
    answer_index: Option<u32>,
    paragraphs: Vec<&'a str>,
}

impl<'a> GroupBuilder<'a> {
    fn new() -> Self {
        Self {
            state: State::Seeking,
            question: None,
            answer_index: None,
            paragraphs: Vec::new(),
        }
    }

    fn feed(&mut self, line: Line<'a>) {
        match (self.state, line) {
            (_, Line::Question { index, text }) => {
                if self.question.is_some() {
                    debug!(index, "duplicate question tag in group, keeping the last");
                }
                self.question = Some((index, text));
            },
            (_, Line::Answer { index, text }) => {
                if self.answer_index.is_some() {
                    debug!(index, "duplicate answer tag in group, restarting answer");
                }
                self.answer_index = Some(index);
                self.paragraphs.clear();
                if !text.is_empty() {
                    self.paragraphs.push(text);
                }
                self.state = State::InAnswer;
            },
            (State::InAnswer, Line::Text(text)) => self.paragraphs.push(text),
            (State::Seeking, Line::Text(text)) => {
                debug!(line = text, "ignoring text outside an answer");
            },
            (_, Line::Blank) => {},
        }
    }

    fn finish(self) -> Option<Record> {
        let Some((question_index, question)) = self.question.filter(|(_, q)| !q.is_empty())
        else {
            debug!("dropping group without a question");
            return None;
        };
        if self.paragraphs.is_empty() {
            debug!(index = question_index, "dropping group without an answer");
            return None;
        }
        Some(Record {
            index: question_index,
            question: question.to_string(),
            answer: self.paragraphs.join(PARAGRAPH_BREAK),
        })
    }
}

/// Split the block into `---`-separated groups, dropping empty ones.
fn groups(body: &str) -> Vec<Vec<&str>> {
    let mut groups = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in body.lines() {
        if line.trim() == GROUP_SEPARATOR {
            if current.iter().any(|l| !l.trim().is_empty()) {
                groups.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if current.iter().any(|l| !l.trim().is_empty()) {
        groups.push(current);
    }
    groups
}

/// Parse every well-formed group of `block` into a [`Record`].
///
/// Never fails: groups missing a question or an answer are dropped and
/// malformed lines are ignored.
pub fn parse(block: &ResultBlock<'_>) -> Vec<Record> {
    let mut records: Vec<Record> = Vec::new();
    for group in groups(block.as_str()) {
        let mut builder = GroupBuilder::new();
        for line in group {
            builder.feed(classify(line));
        }
        let Some(record) = builder.finish() else {
            continue;
        };
        if let Some(prev) = records.last()
            && record.index < prev.index
        {
            warn!(
                previous = prev.index,
                index = record.index,
                "record index decreased, keeping block order"
            );
        }
        records.push(record);
    }
    debug!(records = records.len(), "parsed result block");
    records
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, rstest::rstest};

    fn parse_str(body: &str) -> Vec<Record> {
        parse(&ResultBlock::new(body))
    }

    #[rstest]
    #[case("QUESTION_1:::What?", Line::Question { index: 1, text: "What?" })]
    #[case("  ANSWER_12:::  Because.  ", Line::Answer { index: 12, text: "Because." })]
    #[case("ANSWER_3:::", Line::Answer { index: 3, text: "" })]
    #[case("QUESTION_0:::zero", Line::Text("QUESTION_0:::zero"))]
    #[case("QUESTION_x:::bad", Line::Text("QUESTION_x:::bad"))]
    #[case("QUESTION_:::bad", Line::Text("QUESTION_:::bad"))]
    #[case("QUESTION_1::bad", Line::Text("QUESTION_1::bad"))]
    #[case("   ", Line::Blank)]
    #[case("plain words", Line::Text("plain words"))]
    fn classifies_lines(#[case] input: &str, #[case] expected: Line<'_>) {
        assert_eq!(classify(input), expected);
    }

    #[test]
    fn single_group() {
        let records = parse_str("QUESTION_1:::What caused X?\nANSWER_1:::Because Y.\n---");
        assert_eq!(records, vec![Record {
            index: 1,
            question: "What caused X?".into(),
            answer: "Because Y.".into(),
        }]);
    }

    #[test]
    fn continuation_lines_become_paragraphs() {
        let records =
            parse_str("QUESTION_1:::Q\nANSWER_1:::First line.\nSecond line.\n\nThird line.\n---");
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].answer,
            "First line.\n\nSecond line.\n\nThird line."
        );
        assert_eq!(records[0].paragraphs().count(), 3);
    }

    #[test]
    fn keeps_group_order_with_gaps() {
        let records = parse_str(
            "QUESTION_2:::second\nANSWER_2:::b\n---\nQUESTION_5:::fifth\nANSWER_5:::e\n---",
        );
        let indices: Vec<u32> = records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![2, 5]);
    }

    #[test]
    fn decreasing_index_does_not_reorder() {
        let records =
            parse_str("QUESTION_3:::c\nANSWER_3:::c\n---\nQUESTION_1:::a\nANSWER_1:::a\n---");
        let questions: Vec<&str> = records.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(questions, vec!["c", "a"]);
    }

    #[test]
    fn drops_incomplete_groups() {
        let records = parse_str(
            "QUESTION_1:::no answer\n---\nANSWER_2:::no question\n---\nQUESTION_3:::ok\nANSWER_3:::fine\n---",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].question, "ok");
    }

    #[test]
    fn empty_answer_tag_without_continuation_is_dropped() {
        assert!(parse_str("QUESTION_1:::Q\nANSWER_1:::\n---").is_empty());
    }

    #[test]
    fn empty_answer_tag_with_continuation_keeps_continuation() {
        let records = parse_str("QUESTION_1:::Q\nANSWER_1:::\nbody text\n---");
        assert_eq!(records[0].answer, "body text");
    }

    #[test]
    fn last_question_wins() {
        let records = parse_str("QUESTION_1:::old\nQUESTION_1:::new\nANSWER_1:::a\n---");
        assert_eq!(records[0].question, "new");
    }

    #[test]
    fn later_answer_tag_restarts_buffer() {
        let records = parse_str("QUESTION_1:::Q\nANSWER_1:::one\nmore\nANSWER_2:::two\n---");
        assert_eq!(records[0].answer, "two");
    }

    #[test]
    fn text_before_answer_is_noise() {
        let records = parse_str("QUESTION_1:::Q\nstray line\nANSWER_1:::a\n---");
        assert_eq!(records[0].answer, "a");
    }

    #[test]
    fn trailing_group_without_separator_counts() {
        let records = parse_str("QUESTION_1:::Q\nANSWER_1:::a");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn empty_block_has_no_records() {
        assert!(parse_str("").is_empty());
        assert!(parse_str("---\n---\n").is_empty());
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        let records = parse_str("QUESTION_1:::Q?\r\nANSWER_1:::A.\r\nmore\r\n---\r\n");
        assert_eq!(records[0].question, "Q?");
        assert_eq!(records[0].answer, "A.\n\nmore");
    }

    #[test]
    fn parsing_is_repeatable() {
        let body = "QUESTION_1:::Q\nANSWER_1:::a\n---\nQUESTION_2:::R\nANSWER_2:::b\n---";
        assert_eq!(parse_str(body), parse_str(body));
    }
}
