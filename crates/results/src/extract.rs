//! Locates the delimited result block inside raw process output.
//!
//! The producer frames its results like this (separator lines are runs of
//! `=`, 80 wide in practice):
//!
//! ```text
//! ====
//! TELEGRAM_RESULTS_START
//! ====
//! QUESTION_1:::...
//! ANSWER_1:::...
//! ---
//! ====
//! TELEGRAM_RESULTS_END
//! ====
//! ```

use {regex::Regex, tracing::debug};

use crate::{Error, Result};

/// Suffix appended to a platform marker word to form the start token.
const START_SUFFIX: &str = "_RESULTS_START";

/// Suffix appended to a platform marker word to form the end token.
const END_SUFFIX: &str = "_RESULTS_END";

/// Start and end tokens framing one platform's result block.
#[derive(Debug, Clone)]
pub struct ResultMarkers {
    start: String,
    end: String,
    pattern: Regex,
}

impl ResultMarkers {
    /// Build markers from explicit start/end tokens.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Result<Self> {
        let start = start.into();
        let end = end.into();
        if start.trim().is_empty() || end.trim().is_empty() {
            return Err(Error::invalid_markers("start and end markers must be non-empty"));
        }
        if start == end {
            return Err(Error::invalid_markers(format!(
                "start and end markers are identical: {start}"
            )));
        }
        let pattern = Regex::new(&format!(
            r"(?s){}\r?\n=+\r?\n(?:(.*?)\r?\n)?=+\r?\n{}",
            regex::escape(&start),
            regex::escape(&end),
        ))
        .map_err(|e| Error::invalid_markers(e.to_string()))?;
        Ok(Self {
            start,
            end,
            pattern,
        })
    }

    /// Build `<MARKER>_RESULTS_START` / `<MARKER>_RESULTS_END` from a
    /// platform marker word such as `TELEGRAM`.
    pub fn for_marker(marker: &str) -> Result<Self> {
        let marker = marker.trim();
        if marker.is_empty() {
            return Err(Error::invalid_markers("platform marker must be non-empty"));
        }
        Self::new(format!("{marker}{START_SUFFIX}"), format!("{marker}{END_SUFFIX}"))
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }
}

/// The body of a result block, borrowed from the raw output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultBlock<'a> {
    body: &'a str,
}

impl<'a> ResultBlock<'a> {
    pub fn new(body: &'a str) -> Self {
        Self { body }
    }

    pub fn as_str(&self) -> &'a str {
        self.body
    }

    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Isolate the first well-formed result block in `raw`.
///
/// Returns `None` when no start/end pair with separator lines is present;
/// that is the expected outcome when the producer failed or found nothing
/// and is not an error.
pub fn extract<'a>(raw: &'a str, markers: &ResultMarkers) -> Option<ResultBlock<'a>> {
    let Some(captures) = markers.pattern.captures(raw) else {
        debug!(
            start = %markers.start,
            end = %markers.end,
            raw_len = raw.len(),
            "no result block in process output"
        );
        return None;
    };
    let body = captures.get(1).map_or("", |m| m.as_str());
    debug!(body_len = body.len(), "result block extracted");
    Some(ResultBlock::new(body))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, rstest::rstest};

    fn sep() -> String {
        "=".repeat(80)
    }

    fn framed(marker: &str, body: &str) -> String {
        let sep = sep();
        format!(
            "pipeline noise\n{sep}\n{marker}_RESULTS_START\n{sep}\n{body}\n{sep}\n{marker}_RESULTS_END\n{sep}\ntrailing noise\n"
        )
    }

    #[test]
    fn markers_from_platform_word() {
        let markers = ResultMarkers::for_marker("DISCORD").unwrap();
        assert_eq!(markers.start(), "DISCORD_RESULTS_START");
        assert_eq!(markers.end(), "DISCORD_RESULTS_END");
    }

    #[rstest]
    #[case("", "END")]
    #[case("START", "  ")]
    #[case("SAME", "SAME")]
    fn rejects_bad_markers(#[case] start: &str, #[case] end: &str) {
        assert!(matches!(
            ResultMarkers::new(start, end),
            Err(Error::InvalidMarkers { .. })
        ));
    }

    #[test]
    fn extracts_body_between_separators() {
        let markers = ResultMarkers::for_marker("TELEGRAM").unwrap();
        let raw = framed("TELEGRAM", "QUESTION_1:::Q?\nANSWER_1:::A.\n---");
        let block = extract(&raw, &markers).unwrap();
        assert_eq!(block.as_str(), "QUESTION_1:::Q?\nANSWER_1:::A.\n---");
    }

    #[test]
    fn missing_end_marker_yields_none() {
        let markers = ResultMarkers::for_marker("TELEGRAM").unwrap();
        let sep = sep();
        let raw = format!("{sep}\nTELEGRAM_RESULTS_START\n{sep}\nQUESTION_1:::Q?\nANSWER_1:::A.\n");
        assert!(extract(&raw, &markers).is_none());
    }

    #[test]
    fn missing_separator_line_yields_none() {
        let markers = ResultMarkers::for_marker("TELEGRAM").unwrap();
        let raw = "TELEGRAM_RESULTS_START\nQUESTION_1:::Q?\nTELEGRAM_RESULTS_END\n";
        assert!(extract(raw, &markers).is_none());
    }

    #[test]
    fn other_platform_markers_do_not_match() {
        let markers = ResultMarkers::for_marker("DISCORD").unwrap();
        let raw = framed("TELEGRAM", "QUESTION_1:::Q?\nANSWER_1:::A.\n---");
        assert!(extract(&raw, &markers).is_none());
    }

    #[test]
    fn first_block_wins() {
        let markers = ResultMarkers::for_marker("TELEGRAM").unwrap();
        let raw = format!(
            "{}{}",
            framed("TELEGRAM", "QUESTION_1:::first\nANSWER_1:::one"),
            framed("TELEGRAM", "QUESTION_1:::second\nANSWER_1:::two")
        );
        let block = extract(&raw, &markers).unwrap();
        assert!(block.as_str().contains("first"));
        assert!(!block.as_str().contains("second"));
    }

    #[test]
    fn empty_block_is_found_but_empty() {
        let markers = ResultMarkers::for_marker("TELEGRAM").unwrap();
        let sep = sep();
        let raw = format!(
            "{sep}\nTELEGRAM_RESULTS_START\n{sep}\n{sep}\nTELEGRAM_RESULTS_END\n{sep}\n"
        );
        let block = extract(&raw, &markers).unwrap();
        assert!(block.is_empty());
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let markers = ResultMarkers::for_marker("TELEGRAM").unwrap();
        let raw = framed("TELEGRAM", "QUESTION_1:::Q?\nANSWER_1:::A.").replace('\n', "\r\n");
        let block = extract(&raw, &markers).unwrap();
        assert!(block.as_str().starts_with("QUESTION_1:::Q?"));
    }

    #[test]
    fn marker_text_is_matched_literally() {
        let markers = ResultMarkers::for_marker("A.B").unwrap();
        let raw = framed("AxB", "QUESTION_1:::Q?\nANSWER_1:::A.");
        assert!(extract(&raw, &markers).is_none());
    }
}
