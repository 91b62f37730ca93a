//! Move-search oracle boundary.
//!
//! An oracle scores a position from a chosen side's point of view. Forced
//! mates are folded into the centipawn scale around [`MATE_SCORE`] so that
//! drop comparisons stay plain integer arithmetic.

use shakmaty::{Chess, Color};

use crate::error::OracleError;

/// Magnitude a forced mate is clamped to, in centipawns.
pub const MATE_SCORE: i32 = 1000;

/// Raw engine score, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    /// Mate in N moves (positive = side to move mates, zero or negative = gets mated)
    Mate(i32),
    /// The side has already delivered mate; the opposite view of `Mate(0)`
    MateGiven,
}

impl Score {
    /// Flip to the other side's point of view.
    pub fn negate(self) -> Self {
        match self {
            Score::Cp(cp) => Score::Cp(-cp),
            Score::Mate(0) => Score::MateGiven,
            Score::Mate(n) => Score::Mate(-n),
            Score::MateGiven => Score::Mate(0),
        }
    }

    /// Centipawn value with mates clamped: mate in `n` is `MATE_SCORE - n`,
    /// mated in `n` is `-MATE_SCORE + n`. Already mated is `-MATE_SCORE`.
    pub fn centipawns(self) -> i32 {
        match self {
            Score::Cp(cp) => cp,
            Score::MateGiven => MATE_SCORE,
            Score::Mate(n) if n > 0 => MATE_SCORE - n,
            Score::Mate(n) => -MATE_SCORE - n,
        }
    }
}

/// A position score seen from one perspective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Clamped centipawns for the perspective side
    pub score: i32,
    /// Mate distance for the perspective side, when the search found one
    pub mate: Option<i32>,
    /// Oracle's preferred move in UCI notation
    pub best_move: Option<String>,
}

impl Evaluation {
    /// Convert a side-to-move score into `perspective`'s point of view.
    pub fn from_side_to_move(
        score: Score,
        best_move: Option<String>,
        side_to_move: Color,
        perspective: Color,
    ) -> Self {
        let score = if side_to_move == perspective {
            score
        } else {
            score.negate()
        };
        let mate = match score {
            Score::Mate(n) => Some(n),
            Score::Cp(_) | Score::MateGiven => None,
        };
        Self {
            score: score.centipawns(),
            mate,
            best_move,
        }
    }

    /// True when the perspective side has a forced mate.
    pub fn has_forced_mate(&self) -> bool {
        self.mate.is_some_and(|n| n > 0)
    }
}

/// A long-lived evaluation session.
///
/// Implementations own an external resource; `close` releases it and is
/// called exactly once per walk by [`crate::walker::run_with_oracle`].
#[allow(async_fn_in_trait)]
pub trait Oracle {
    async fn evaluate(
        &mut self,
        position: &Chess,
        perspective: Color,
    ) -> Result<Evaluation, OracleError>;

    async fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_clamping() {
        assert_eq!(Score::Cp(35).centipawns(), 35);
        assert_eq!(Score::Mate(3).centipawns(), 997);
        assert_eq!(Score::Mate(-3).centipawns(), -997);
        assert_eq!(Score::Mate(0).centipawns(), -1000);
        assert_eq!(Score::MateGiven.centipawns(), 1000);
        assert_eq!(Score::Mate(0).negate(), Score::MateGiven);
        assert_eq!(Score::Mate(4).negate(), Score::Mate(-4));
    }

    #[test]
    fn test_perspective_flip() {
        let eval = Evaluation::from_side_to_move(Score::Cp(120), None, Color::Black, Color::White);
        assert_eq!(eval.score, -120);
        assert_eq!(eval.mate, None);

        let eval = Evaluation::from_side_to_move(Score::Cp(120), None, Color::White, Color::White);
        assert_eq!(eval.score, 120);
    }

    #[test]
    fn test_mated_side_to_move_is_winning_for_opponent() {
        // Side to move is checkmated: great for the other side
        let eval = Evaluation::from_side_to_move(Score::Mate(0), None, Color::Black, Color::White);
        assert_eq!(eval.score, 1000);
        assert_eq!(eval.mate, None);
        assert!(!eval.has_forced_mate());

        let eval = Evaluation::from_side_to_move(Score::Mate(2), None, Color::White, Color::White);
        assert!(eval.has_forced_mate());
        assert_eq!(eval.score, 998);
    }
}
