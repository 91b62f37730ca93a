//! Parsing of Lichess "literate" move comments such as
//! `(0.27 → -2.89) Blunder. Nf6 was best.`

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static SWING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*([^()]+?)\s*→\s*([^()]+?)\s*\)").expect("valid regex"));

static BEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S+?) was best").expect("valid regex"));

/// Judgment attached to a move by the annotation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Blunder,
    Mistake,
    Inaccuracy,
    None,
}

impl Severity {
    /// Markers are matched case-sensitively; `Blunder` wins over the others.
    pub fn from_comment(comment: &str) -> Self {
        if comment.contains("Blunder") {
            Severity::Blunder
        } else if comment.contains("Mistake") {
            Severity::Mistake
        } else if comment.contains("Inaccuracy") {
            Severity::Inaccuracy
        } else {
            Severity::None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub severity: Severity,
    /// Evaluation before and after the move, verbatim (`"0.27"`, `"Mate in 3"`).
    pub swing: Option<(String, String)>,
    /// Suggested replacement move in SAN.
    pub best_move: Option<String>,
}

impl Annotation {
    pub fn parse(comment: &str) -> Self {
        let swing = SWING_RE
            .captures(comment)
            .map(|cap| (cap[1].to_string(), cap[2].to_string()));
        let best_move = BEST_RE
            .captures(comment)
            .map(|cap| cap[1].trim_end_matches('.').to_string());

        Self {
            severity: Severity::from_comment(comment),
            swing,
            best_move,
        }
    }
}
