//! Text rendering for predictions and options

use hydroponics_core::{InputBounds, NumericRange, PredictionVector, RawInputs};
use serde::Serialize;
use std::fmt;

/// Widest bar in the nutrient chart, in characters
pub const BAR_WIDTH: usize = 40;

/// Whole cultivation days, ties to even
pub fn rounded_days(prediction: &PredictionVector) -> f64 {
    prediction.cultivation_days.round_ties_even()
}

/// Machine-readable prediction document
#[derive(Debug, Serialize)]
pub struct PredictionReport<'a> {
    pub inputs: &'a RawInputs,
    pub prediction: &'a PredictionVector,
    pub cultivation_days_rounded: f64,
    pub recommendation: &'a str,
}

impl<'a> PredictionReport<'a> {
    pub fn new(
        inputs: &'a RawInputs,
        prediction: &'a PredictionVector,
        recommendation: &'a str,
    ) -> Self {
        Self {
            inputs,
            prediction,
            cultivation_days_rounded: rounded_days(prediction),
            recommendation,
        }
    }
}

/// Days rounded to whole days; nutrients with two decimals
pub struct Summary<'a> {
    pub inputs: &'a RawInputs,
    pub prediction: &'a PredictionVector,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Prediction for {} ({})",
            self.inputs.plant_type, self.inputs.growth_stage
        )?;
        writeln!(f, "  Cultivation days: {:.0}", rounded_days(self.prediction))?;
        for (label, value) in self.prediction.nutrients() {
            writeln!(f, "  Total {:<3} {:>10.2}", label, value)?;
        }
        Ok(())
    }
}

/// Horizontal bars for N, P, K, Ca and Mg scaled to the largest value
pub struct BarChart<'a> {
    pub prediction: &'a PredictionVector,
    pub width: usize,
}

impl fmt::Display for BarChart<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nutrients = self.prediction.nutrients();
        let max = nutrients
            .iter()
            .map(|(_, value)| *value)
            .fold(0.0_f64, f64::max);
        let width = self.width;

        for (label, value) in nutrients {
            let len = if max > 0.0 && value > 0.0 {
                ((value / max) * width as f64).round() as usize
            } else {
                0
            };
            writeln!(f, "  {:<3}|{:<width$}| {:.2}", label, "#".repeat(len), value)?;
        }
        Ok(())
    }
}

fn describe(range: &NumericRange) -> String {
    match range.step {
        Some(step) => format!("{} to {} (step {})", range.min, range.max, step),
        None => format!("{} to {}", range.min, range.max),
    }
}

/// Selectable categories and advisory numeric ranges
pub struct OptionsListing<'a> {
    pub plant_types: &'a [String],
    pub growth_stages: &'a [String],
    pub bounds: &'a InputBounds,
}

impl fmt::Display for OptionsListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plant types:")?;
        for plant in self.plant_types {
            writeln!(f, "  {plant}")?;
        }
        writeln!(f, "Growth stages:")?;
        for stage in self.growth_stages {
            writeln!(f, "  {stage}")?;
        }

        let bounds = self.bounds;
        writeln!(f, "Ranges:")?;
        writeln!(f, "  Temperature (°C): {}", describe(&bounds.temperature))?;
        writeln!(f, "  Humidity (%): {}", describe(&bounds.humidity))?;
        writeln!(f, "  Light intensity (lux): {}", describe(&bounds.light_intensity))?;
        writeln!(f, "  Plant count: {}", describe(&bounds.plant_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydroponics_core::INPUT_BOUNDS;

    fn prediction() -> PredictionVector {
        PredictionVector::from_array([119.6, 200.0, 50.0, 100.456, 0.0, 5.0])
    }

    fn inputs() -> RawInputs {
        RawInputs {
            plant_type: "Tomato".to_string(),
            growth_stage: "Flowering".to_string(),
            temperature: 28.0,
            humidity: 65.0,
            light_intensity: 20_000.0,
            plant_count: 40,
        }
    }

    #[test]
    fn test_summary_rounding() {
        let prediction = prediction();
        let text = Summary {
            inputs: &inputs(),
            prediction: &prediction,
        }
        .to_string();
        assert!(text.starts_with("Prediction for Tomato (Flowering)"));
        assert!(text.contains("Cultivation days: 120\n"));
        assert!(text.contains("100.46"));
        assert!(text.contains("5.00"));
    }

    #[test]
    fn test_text_and_json_days_agree_on_ties() -> anyhow::Result<()> {
        let inputs = inputs();
        for (days, expected) in [(120.5, 120.0), (121.5, 122.0), (119.6, 120.0)] {
            let prediction = PredictionVector::from_array([days, 1.0, 1.0, 1.0, 1.0, 1.0]);

            let text = Summary {
                inputs: &inputs,
                prediction: &prediction,
            }
            .to_string();
            assert!(text.contains(&format!("Cultivation days: {expected}\n")), "{text}");

            let report = PredictionReport::new(&inputs, &prediction, "advice");
            let json: serde_json::Value = serde_json::to_value(&report)?;
            assert_eq!(json["cultivation_days_rounded"], expected);
        }
        Ok(())
    }

    #[test]
    fn test_bar_chart_scales_to_largest() {
        let prediction = prediction();
        let chart = BarChart {
            prediction: &prediction,
            width: 20,
        }
        .to_string();
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines.len(), 5);

        let bars: Vec<usize> = lines.iter().map(|l| l.matches('#').count()).collect();
        assert_eq!(bars, vec![20, 5, 10, 0, 1]);
        assert!(lines[0].starts_with("  N  |"));
    }

    #[test]
    fn test_bar_chart_handles_all_zero() {
        let zero = PredictionVector::from_array([0.0; 6]);
        let chart = BarChart {
            prediction: &zero,
            width: 10,
        };
        assert_eq!(chart.to_string().matches('#').count(), 0);
    }

    #[test]
    fn test_options_listing() {
        let text = OptionsListing {
            plant_types: &["Chilli".to_string(), "Tomato".to_string()],
            growth_stages: &["Flowering".to_string()],
            bounds: &INPUT_BOUNDS,
        }
        .to_string();
        assert!(text.contains("  Chilli\n  Tomato\n"));
        assert!(text.contains("Light intensity (lux): 5000 to 40000 (step 1000)"));
        assert!(text.contains("Plant count: 10 to 100"));
    }
}
