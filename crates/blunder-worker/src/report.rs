//! Human-readable rendering of pipeline results

use chess_core::game_data::{move_prefix, side_name};
use shakmaty::Color;

use crate::extractor::AnnotatedBlunder;
use crate::walker::{Blunder, MissedMate, WalkReport};

pub fn format_blunder(blunder: &Blunder) -> String {
    let mut line = format!(
        "Move {} ({}): {} {}, score drop {} cp ({} → {})",
        blunder.move_number,
        side_name(blunder.side),
        move_prefix(blunder.move_number, blunder.side),
        blunder.san,
        blunder.score_drop,
        blunder.score_before,
        blunder.score_after,
    );
    if let Some(best) = &blunder.best_move {
        line.push_str(&format!(", best was {best}"));
    }
    line
}

pub fn format_missed_mate(missed: &MissedMate) -> String {
    format!(
        "Move {} ({}): {} {} missed mate in {}, {} was best",
        missed.move_number,
        side_name(missed.side),
        move_prefix(missed.move_number, missed.side),
        missed.san,
        missed.mate_in,
        missed.best_move,
    )
}

/// Report for the direct-evaluation pipeline.
pub fn render_engine_report(player: &str, side: Color, threshold: i32, report: &WalkReport) -> String {
    let mut out = format!(
        "{player} played {}; {} moves evaluated, threshold {threshold} cp\n",
        side_name(side),
        report.evaluated_moves,
    );

    if report.blunders.is_empty() {
        out.push_str(&format!("No blunders detected for {player}.\n"));
    } else {
        out.push_str(&format!("Detected {} blunder(s) by {player}:\n", report.blunders.len()));
        for blunder in &report.blunders {
            out.push_str(&format!("  {}\n", format_blunder(blunder)));
            out.push_str(&format!("    FEN before: {}\n", blunder.fen_before));
        }
    }

    if !report.missed_mates.is_empty() {
        out.push_str(&format!("Missed mates ({}):\n", report.missed_mates.len()));
        for missed in &report.missed_mates {
            out.push_str(&format!("  {}\n", format_missed_mate(missed)));
        }
    }
    out
}

/// Report for the annotation-extraction pipeline. Labels come from the
/// annotation service's own thresholds, which need not match ours.
pub fn render_annotation_report(player: &str, blunders: &[AnnotatedBlunder]) -> String {
    let mut out = String::new();
    if blunders.is_empty() {
        out.push_str(&format!("No blunders detected for {player}.\n"));
    } else {
        out.push_str(&format!("Detected {} blunder(s) by {player}:\n", blunders.len()));
        for blunder in blunders {
            out.push_str(&format!("  {blunder}\n"));
        }
    }
    out.push_str("(Blunder labels assigned by the annotation service, not by the local threshold.)\n");
    out
}
