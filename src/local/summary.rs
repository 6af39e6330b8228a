use colored::Colorize;

use crate::acquisition::{AcquisitionStatus, EegReport};
use crate::game::{Metric, RoundResult, NO_WORD};

const EVENTS_SHOWN: usize = 5;

/// `Time: 1.23 seconds` for gaze tallies, `Deviations: 7` for EEG counts.
pub fn format_metric(metric: Metric, frame_rate: f64) -> String {
    match metric {
        Metric::GazeFrames(frames) => {
            format!("Time: {:.2} seconds", frames as f64 / frame_rate)
        }
        Metric::Deviations(count) => format!("Deviations: {count}"),
    }
}

pub fn print_round(result: &RoundResult, frame_rate: f64) {
    println!();
    println!("{}", format!("Round {} Results", result.index).bold());
    println!("  Words: {}", result.words.join("  "));
    let word = if result.chosen_word == NO_WORD {
        result.chosen_word.dimmed()
    } else {
        result.chosen_word.green().bold()
    };
    println!("  Word: {word}");
    println!("  {}", format_metric(result.metric, frame_rate));
}

pub fn print_summary(results: &[RoundResult], frame_rate: f64, eeg: Option<&EegReport>) {
    println!();
    println!("{}", "Game Over!".bold().cyan());
    if results.is_empty() {
        println!("  No rounds completed.");
    }
    for result in results {
        println!(
            "  Round {}: {} ({})",
            result.index,
            result.chosen_word,
            format_metric(result.metric, frame_rate)
        );
    }

    if let Some(report) = eeg {
        print_eeg_report(report);
    }
}

fn print_eeg_report(report: &EegReport) {
    println!();
    println!("{}", "EEG".bold());
    let status = match &report.status {
        AcquisitionStatus::Failed(reason) => format!("failed: {reason}").red(),
        other => format!("{other:?}").normal(),
    };
    println!("  Status: {status}");
    println!(
        "  Samples: {} ({:.1} s at {} Hz)",
        report.raw.len(),
        if report.sample_rate > 0.0 {
            report.raw.len() as f64 / report.sample_rate
        } else {
            0.0
        },
        report.sample_rate
    );
    println!("  Filtered mean: {:.4}", report.mean);
    println!(
        "  Deviations logged: {}",
        report.events.len().to_string().yellow().bold()
    );
    for event in report.events.iter().take(EVENTS_SHOWN) {
        println!(
            "    {:.4}s - {:.4}s  magnitude {:.2}",
            event.start_time, event.end_time, event.magnitude
        );
    }
    if report.events.len() > EVENTS_SHOWN {
        println!("    ... {} more", report.events.len() - EVENTS_SHOWN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaze_frames_are_shown_as_seconds() {
        assert_eq!(
            format_metric(Metric::GazeFrames(45), 30.0),
            "Time: 1.50 seconds"
        );
    }

    #[test]
    fn deviations_are_shown_as_a_count() {
        assert_eq!(format_metric(Metric::Deviations(12), 30.0), "Deviations: 12");
    }
}
