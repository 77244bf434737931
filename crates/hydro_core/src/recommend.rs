//! Static cultivation advice keyed by plant type and growth stage

/// Advice when no plant rule matches
pub const DEFAULT_ADVICE: &str =
    "Maintain optimal nutrient balance and adjust light intensity to 20k–25k lux.";

struct StageRule {
    keyword: &'static str,
    advice: &'static str,
}

enum Advice {
    Fixed(&'static str),
    ByStage {
        stages: &'static [StageRule],
        otherwise: &'static str,
    },
}

struct PlantRule {
    keyword: &'static str,
    advice: Advice,
}

/// Evaluated top to bottom; first match wins
const RULES: &[PlantRule] = &[
    PlantRule {
        keyword: "tomato",
        advice: Advice::ByStage {
            stages: &[
                StageRule {
                    keyword: "vegetative",
                    advice: "Increase nitrogen slightly for leaf growth and maintain temperature around 28°C.",
                },
                StageRule {
                    keyword: "flowering",
                    advice: "Increase potassium and calcium for better fruit set and firmness.",
                },
            ],
            otherwise: "Maintain balanced NPK and avoid excess humidity.",
        },
    },
    PlantRule {
        keyword: "chilli",
        advice: Advice::Fixed(
            "Keep humidity near 60% and ensure high potassium during flowering.",
        ),
    },
    PlantRule {
        keyword: "cucumber",
        advice: Advice::Fixed("Maintain high humidity (70–80%) and balanced NPK levels."),
    },
    PlantRule {
        keyword: "brinjal",
        advice: Advice::Fixed(
            "Slightly higher nitrogen in early stage; increase potassium during fruiting.",
        ),
    },
    PlantRule {
        keyword: "bitter",
        advice: Advice::Fixed(
            "Ensure ample nitrogen and train vines properly to improve airflow.",
        ),
    },
];

/// Advisory text for a plant type and growth stage.
///
/// Matching is a case-insensitive substring test, so "Cherry Tomato" and
/// "Bitter Gourd" pick up the tomato and bitter rules.
pub fn recommend(plant_type: &str, growth_stage: &str) -> &'static str {
    let plant = plant_type.to_lowercase();
    let stage = growth_stage.to_lowercase();

    let Some(rule) = RULES.iter().find(|rule| plant.contains(rule.keyword)) else {
        return DEFAULT_ADVICE;
    };

    match &rule.advice {
        Advice::Fixed(advice) => *advice,
        Advice::ByStage { stages, otherwise } => stages
            .iter()
            .find(|s| stage.contains(s.keyword))
            .map_or(*otherwise, |s| s.advice),
    }
}
