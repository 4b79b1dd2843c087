//! Terminal rendering of the headline and confidence chart.

use moodlens_core::{AnalysisResult, ErrorInfo};

const BAR_WIDTH: usize = 40;

pub fn render_result(result: &AnalysisResult) -> String {
    let series = result.series();
    let label_width = series
        .points
        .iter()
        .map(|p| p.label.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = format!("{}\n\n{}\n", result.headline(), series.title);
    for point in &series.points {
        let filled = ((point.confidence / series.y_max) * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);
        out.push_str(&format!(
            "  {:<label_width$}  {}{}  {:.2}\n",
            point.label,
            "█".repeat(filled),
            " ".repeat(BAR_WIDTH - filled),
            point.confidence,
        ));
    }
    out
}

pub fn render_error(error: &ErrorInfo) -> String {
    format!("error: {}\n  cause: {}", error.message, error.cause)
}
