//! Result adapter — reshapes the service response into a headline and an
//! ordered chart series.

use crate::error::AnalysisError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Order in which the distribution is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistributionOrder {
    /// Ascending by label. Reproducible regardless of the wire order.
    #[default]
    Label,
    /// The key order of the service's `all_emotions` object.
    Service,
}

impl FromStr for DistributionOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "label" => Ok(Self::Label),
            "service" => Ok(Self::Service),
            other => Err(format!("unknown distribution order: {other} (expected label or service)")),
        }
    }
}

/// Response body of `POST /predict`.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    predicted_emotion: String,
    confidence: f64,
    all_emotions: IndexMap<String, f64>,
}

/// A well-formed analysis: every confidence lies in [0, 1] and
/// `top_label` is a key of `distribution`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub top_label: String,
    pub top_confidence: f64,
    pub distribution: IndexMap<String, f64>,
}

/// One bar of the confidence chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub confidence: f64,
}

/// Chart-ready data: a single "Confidence" dataset on a 0..1 axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub title: &'static str,
    pub y_max: f64,
    pub points: Vec<ChartPoint>,
}

impl AnalysisResult {
    /// Parse a raw response body.
    pub fn parse(raw: &str, order: DistributionOrder) -> Result<Self, AnalysisError> {
        let response: PredictResponse = serde_json::from_str(raw)
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

        if response.all_emotions.is_empty() {
            return Err(AnalysisError::MalformedResponse(
                "all_emotions is empty".into(),
            ));
        }
        if !response.all_emotions.contains_key(&response.predicted_emotion) {
            return Err(AnalysisError::MalformedResponse(format!(
                "predicted_emotion {:?} is not a key of all_emotions",
                response.predicted_emotion
            )));
        }

        let mut distribution: IndexMap<String, f64> = response
            .all_emotions
            .into_iter()
            .map(|(label, value)| {
                let clamped = clamp_unit(value);
                if clamped != value {
                    tracing::debug!(label = %label, value, "clamped confidence into [0, 1]");
                }
                (label, clamped)
            })
            .collect();
        if order == DistributionOrder::Label {
            distribution.sort_keys();
        }

        Ok(Self {
            top_label: response.predicted_emotion,
            top_confidence: clamp_unit(response.confidence),
            distribution,
        })
    }

    /// Headline such as `happy (87%)`.
    pub fn headline(&self) -> String {
        format!("{} ({}%)", self.top_label, (self.top_confidence * 100.0).round() as u32)
    }

    pub fn series(&self) -> ChartSeries {
        ChartSeries {
            title: "Confidence",
            y_max: 1.0,
            points: self
                .distribution
                .iter()
                .map(|(label, &confidence)| ChartPoint {
                    label: label.clone(),
                    confidence,
                })
                .collect(),
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAPPY: &str = r#"{"predicted_emotion":"happy","confidence":0.87,
        "all_emotions":{"happy":0.87,"sad":0.05,"angry":0.08}}"#;

    fn labels(result: &AnalysisResult) -> Vec<&str> {
        result.distribution.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_parse_happy_label_order() {
        let result = AnalysisResult::parse(HAPPY, DistributionOrder::Label).unwrap();
        assert_eq!(result.headline(), "happy (87%)");
        let series = result.series();
        let expected = [("angry", 0.08), ("happy", 0.87), ("sad", 0.05)];
        assert_eq!(series.points.len(), expected.len());
        for (point, (label, confidence)) in series.points.iter().zip(expected) {
            assert_eq!(point.label, label);
            assert!((point.confidence - confidence).abs() < 1e-9);
        }
        assert_eq!(series.title, "Confidence");
        assert_eq!(series.y_max, 1.0);
    }

    #[test]
    fn test_parse_service_order_kept() {
        let result = AnalysisResult::parse(HAPPY, DistributionOrder::Service).unwrap();
        assert_eq!(labels(&result), vec!["happy", "sad", "angry"]);
    }

    #[test]
    fn test_parse_is_reproducible() {
        let a = AnalysisResult::parse(HAPPY, DistributionOrder::Label).unwrap();
        let b = AnalysisResult::parse(HAPPY, DistributionOrder::Label).unwrap();
        assert_eq!(labels(&a), labels(&b));
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let raw = r#"{"predicted_emotion":"Happy","confidence":1.0000002,
            "all_emotions":{"Happy":1.0000002,"Sad":-0.0000001}}"#;
        let result = AnalysisResult::parse(raw, DistributionOrder::Label).unwrap();
        assert_eq!(result.top_confidence, 1.0);
        assert_eq!(result.distribution["Happy"], 1.0);
        assert_eq!(result.distribution["Sad"], 0.0);
        assert!(result.distribution.values().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(result.headline(), "Happy (100%)");
    }

    #[test]
    fn test_integer_confidence_accepted() {
        let raw = r#"{"predicted_emotion":"Neutral","confidence":1,"all_emotions":{"Neutral":1}}"#;
        let result = AnalysisResult::parse(raw, DistributionOrder::Label).unwrap();
        assert_eq!(result.top_confidence, 1.0);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let raw = r#"{"predicted_emotion":"happy","all_emotions":{"happy":0.9}}"#;
        let err = AnalysisResult::parse(raw, DistributionOrder::Label).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedResponse(_)));
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let raw = r#"{"predicted_emotion":"happy","confidence":"high","all_emotions":{"happy":0.9}}"#;
        assert!(matches!(
            AnalysisResult::parse(raw, DistributionOrder::Label),
            Err(AnalysisError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_empty_distribution_is_malformed() {
        let raw = r#"{"predicted_emotion":"happy","confidence":0.9,"all_emotions":{}}"#;
        assert!(matches!(
            AnalysisResult::parse(raw, DistributionOrder::Label),
            Err(AnalysisError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_top_label_absent_from_distribution_is_malformed() {
        let raw = r#"{"predicted_emotion":"fear","confidence":0.9,"all_emotions":{"happy":0.9}}"#;
        assert!(matches!(
            AnalysisResult::parse(raw, DistributionOrder::Label),
            Err(AnalysisError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_not_json_is_malformed() {
        assert!(matches!(
            AnalysisResult::parse("<html>502</html>", DistributionOrder::Label),
            Err(AnalysisError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_distribution_order_from_str() {
        assert_eq!("label".parse::<DistributionOrder>(), Ok(DistributionOrder::Label));
        assert_eq!(" Service ".parse::<DistributionOrder>(), Ok(DistributionOrder::Service));
        assert!("random".parse::<DistributionOrder>().is_err());
    }
}
