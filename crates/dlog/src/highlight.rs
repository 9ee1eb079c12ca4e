//! Keyword highlighting and entry-level filtering of log lines.

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::io::Write;
use std::sync::LazyLock;

/// Escape sequence opening a highlighted span (bright yellow)
pub const HIGHLIGHT_START: &str = "\x1b[93m";
/// Escape sequence closing a highlighted span
pub const HIGHLIGHT_END: &str = "\x1b[0m";

static ENTRY_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("entry start pattern is valid")
});

/// Finds a literal keyword in a line and wraps the first hit in color codes
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Regex,
}

impl Highlighter {
    /// Match `keyword` literally, optionally ignoring case
    pub fn new(keyword: &str, ignore_case: bool) -> Result<Self> {
        let pattern = RegexBuilder::new(&regex::escape(keyword))
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| Error::InvalidArgument(format!("keyword: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Whether the keyword occurs in `line`
    pub fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    /// `line` with its first keyword match wrapped, or unchanged
    pub fn highlight<'a>(&self, line: &'a str) -> Cow<'a, str> {
        match self.pattern.find(line) {
            Some(m) => Cow::Owned(format!(
                "{}{}{}{}{}",
                &line[..m.start()],
                HIGHLIGHT_START,
                m.as_str(),
                HIGHLIGHT_END,
                &line[m.end()..]
            )),
            None => Cow::Borrowed(line),
        }
    }
}

/// Whether `line` opens a new log entry (starts with `YYYY-MM-DD`)
pub fn is_entry_start(line: &str) -> bool {
    ENTRY_START.is_match(line)
}

/// Groups lines into entries and keeps only entries that mention the keyword.
///
/// An entry is a dated line plus the undated lines after it (stack traces,
/// wrapped messages). The dated line is held back until it is known whether
/// the entry matches.
#[derive(Debug)]
pub struct EntryFilter {
    highlighter: Highlighter,
    pending: Option<String>,
    entry_matched: bool,
}

impl EntryFilter {
    /// Filter entries by `highlighter`'s keyword
    pub fn new(highlighter: Highlighter) -> Self {
        Self {
            highlighter,
            pending: None,
            entry_matched: false,
        }
    }

    /// Feed one line, writing whatever can be decided now
    pub fn push<W: Write>(&mut self, line: &str, out: &mut W) -> std::io::Result<()> {
        let matched = self.highlighter.is_match(line);

        if is_entry_start(line) {
            self.flush(out)?;
            self.pending = Some(line.to_string());
            self.entry_matched = matched;
            return Ok(());
        }

        if self.entry_matched || matched {
            if let Some(start) = self.pending.take() {
                writeln!(out, "{}", self.highlighter.highlight(&start))?;
            }
            writeln!(out, "{}", self.highlighter.highlight(line))?;
            self.entry_matched = true;
        }
        Ok(())
    }

    /// Write the held-back entry line if its entry matched
    pub fn flush<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        if let Some(start) = self.pending.take() {
            if self.entry_matched {
                writeln!(out, "{}", self.highlighter.highlight(&start))?;
            }
        }
        self.entry_matched = false;
        Ok(())
    }
}

/// Per-line output policy chosen from the request flags
#[derive(Debug)]
pub enum LineProcessor {
    /// No keyword: lines are copied as-is
    Passthrough,
    /// Every line is printed, matches highlighted
    Highlight(Highlighter),
    /// Only matching entries are printed
    MatchingOnly(EntryFilter),
}

impl LineProcessor {
    /// Pick the policy for a keyword and flags
    pub fn new(keyword: Option<&str>, ignore_case: bool, matching_only: bool) -> Result<Self> {
        Ok(match keyword {
            None => LineProcessor::Passthrough,
            Some(keyword) => {
                let highlighter = Highlighter::new(keyword, ignore_case)?;
                if matching_only {
                    LineProcessor::MatchingOnly(EntryFilter::new(highlighter))
                } else {
                    LineProcessor::Highlight(highlighter)
                }
            }
        })
    }

    /// Process one line of log output
    pub fn push<W: Write>(&mut self, line: &str, out: &mut W) -> std::io::Result<()> {
        match self {
            LineProcessor::Passthrough => writeln!(out, "{}", line),
            LineProcessor::Highlight(h) => writeln!(out, "{}", h.highlight(line)),
            LineProcessor::MatchingOnly(filter) => filter.push(line, out),
        }
    }

    /// End of output: write anything still held back
    pub fn finish<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        match self {
            LineProcessor::MatchingOnly(filter) => filter.flush(out),
            _ => Ok(()),
        }
    }
}
