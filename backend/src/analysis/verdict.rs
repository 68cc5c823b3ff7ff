/// Decision boundary on the classifier's raw output.
pub const HEALTH_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthLabel {
    Healthy,
    Affected,
}

impl HealthLabel {
    pub fn display_name(self) -> &'static str {
        match self {
            HealthLabel::Healthy => "Healthy Plant",
            HealthLabel::Affected => "Affected Plant (Pest/Disease detected)",
        }
    }
}

/// Terminal artifact of a successful analysis.
#[derive(Debug, Clone)]
pub struct LeafAnalysis {
    pub label: HealthLabel,
    /// Percentage in `[50.0, 100.0]`, rounded to one decimal.
    pub confidence_pct: f32,
    pub recommendation: &'static str,
    /// Raw classifier output (clamped into `[0.0, 1.0]`), kept for traceability.
    pub raw_prediction: f32,
}

/// Turns the classifier's raw scalar into a graded verdict.
///
/// Predictions strictly above 0.5 read as healthy with confidence equal to
/// the prediction; everything else reads as affected with confidence
/// `1 - prediction`. Confidence is clamped to `[0.5, 1.0]` so a boundary
/// output never reports below a coin flip.
pub fn build_verdict(raw_prediction: f32) -> LeafAnalysis {
    let raw = raw_prediction.clamp(0.0, 1.0);
    let (label, confidence) = if raw > HEALTH_THRESHOLD {
        (HealthLabel::Healthy, raw)
    } else {
        (HealthLabel::Affected, 1.0 - raw)
    };
    let confidence = confidence.clamp(0.5, 1.0);
    LeafAnalysis {
        label,
        confidence_pct: (confidence * 1000.0).round() / 10.0,
        recommendation: recommendation_for(label, confidence),
        raw_prediction: raw,
    }
}

// Four confidence bands per label, strict comparisons at every boundary.
fn recommendation_for(label: HealthLabel, confidence: f32) -> &'static str {
    match label {
        HealthLabel::Healthy => {
            if confidence > 0.9 {
                "Excellent! Your plant appears very healthy. Continue your current care routine including proper watering, lighting, and nutrition."
            } else if confidence > 0.8 {
                "Plant looks healthy overall. Maintain current growing conditions and monitor regularly for any changes."
            } else if confidence > 0.7 {
                "Plant appears mostly healthy. Keep monitoring and ensure optimal growing conditions (proper light, water, and nutrients)."
            } else {
                "Plant seems healthy but with some uncertainty. Monitor closely for any signs of stress, pests, or disease."
            }
        }
        HealthLabel::Affected => {
            if confidence > 0.9 {
                "High confidence detection of pest/disease issues. Immediate action recommended: isolate plant, inspect thoroughly for pests or disease symptoms, and apply appropriate treatment."
            } else if confidence > 0.8 {
                "Likely pest or disease detected. Inspect plant carefully for signs of damage, discoloration, or pests. Consider preventive treatment."
            } else if confidence > 0.7 {
                "Possible plant health issues detected. Check for common problems: overwatering, underwatering, nutrient deficiency, or early pest signs."
            } else {
                "Some concerns detected but with lower confidence. Monitor plant closely and check growing conditions (light, water, soil, temperature)."
            }
        }
    }
}
