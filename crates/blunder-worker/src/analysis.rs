//! Blunder detection rules. Pure functions only.
//! (No Board/Engine/Game dependencies)

use crate::oracle::Evaluation;

/// Baseline threshold (centipawn drop) when none is configured
pub const DEFAULT_BLUNDER_THRESHOLD: i32 = 300;

/// Evaluation lost by a move, both scores from the mover's perspective.
/// Negative when the move improved the position.
pub fn score_drop(score_before: i32, score_after: i32) -> i32 {
    score_before - score_after
}

/// A drop exactly equal to the threshold counts.
pub fn is_blunder(score_before: i32, score_after: i32, threshold: i32) -> bool {
    score_drop(score_before, score_after) >= threshold
}

/// The mover had a forced mate and played something other than the
/// oracle's mating move.
pub fn is_missed_mate(before: &Evaluation, played_uci: &str) -> bool {
    before.has_forced_mate()
        && before
            .best_move
            .as_deref()
            .is_some_and(|best| best != played_uci)
}
