use crate::domain::model::{
    AspectDetail, AspectScore, AstrologicalScore, CompatibilityScore, ElementScore, Explanation,
    MatchReport, QuestionnaireScore,
};

pub const QUESTIONNAIRE_WEIGHT: f64 = 0.5;
pub const ASTROLOGICAL_WEIGHT: f64 = 0.5;

pub const HARMONIOUS_ELEMENT_SCORE: f64 = 75.0;
pub const FRICTION_ELEMENT_SCORE: f64 = 55.0;
pub const STRONG_ASTROLOGICAL_SCORE: f64 = 70.0;
pub const CHALLENGING_ASTROLOGICAL_SCORE: f64 = 45.0;
pub const SIGNIFICANT_ASPECT_SCORE: f64 = 0.5;
pub const MAX_LISTED_ASPECTS: usize = 5;

/// 四捨五入後限制在 0..=100
pub fn combine_total(questionnaire: f64, astrological: f64) -> u8 {
    let total = questionnaire * QUESTIONNAIRE_WEIGHT + astrological * ASTROLOGICAL_WEIGHT;
    if total.is_nan() {
        return 50;
    }
    total.round().clamp(0.0, 100.0) as u8
}

pub fn combine(questionnaire: QuestionnaireScore, aspect: AspectScore, element: ElementScore) -> MatchReport {
    let astrological = AstrologicalScore {
        total: aspect.total,
        aspect,
        element,
    };
    let total = combine_total(questionnaire.total, astrological.total);
    let explanation = explain(&astrological);

    MatchReport {
        score: CompatibilityScore {
            total,
            questionnaire,
            astrological,
        },
        explanation,
    }
}

pub fn explain(astrological: &AstrologicalScore) -> Explanation {
    Explanation {
        astrological: describe_astrological(astrological.total),
        aspects: describe_aspects(&astrological.aspect.details),
        elements: describe_elements(&astrological.element),
    }
}

pub fn describe_elements(element: &ElementScore) -> String {
    let pairing = if element.element1 == element.element2 {
        format!("{} and {} share the {} element", element.sign1, element.sign2, element.element1)
    } else {
        format!(
            "{} ({}) and {} ({})",
            element.sign1, element.element1, element.sign2, element.element2
        )
    };

    if element.score >= HARMONIOUS_ELEMENT_SCORE {
        format!("{}: a harmonious match with natural understanding.", pairing)
    } else if element.score <= FRICTION_ELEMENT_SCORE {
        format!(
            "{}: likely friction; expect difficulties that need patience and compromise.",
            pairing
        )
    } else {
        format!("{}: a balanced pairing with room to grow.", pairing)
    }
}

pub fn describe_astrological(total: f64) -> String {
    let verdict = if total >= STRONG_ASTROLOGICAL_SCORE {
        "Strong astrological compatibility"
    } else if total < CHALLENGING_ASTROLOGICAL_SCORE {
        "Challenging astrological compatibility"
    } else {
        "Moderate astrological compatibility"
    };
    format!("{} ({:.0}/100).", verdict, total)
}

/// 只列出 |score| 達門檻的相位，由強到弱，最多五個
pub fn describe_aspects(details: &[AspectDetail]) -> String {
    let mut significant: Vec<&AspectDetail> = details
        .iter()
        .filter(|d| d.score.abs() >= SIGNIFICANT_ASPECT_SCORE)
        .collect();

    if significant.is_empty() {
        return "No significant planetary aspects.".to_string();
    }

    significant.sort_by(|a, b| {
        b.score
            .abs()
            .total_cmp(&a.score.abs())
            .then_with(|| a.planet1.cmp(&b.planet1))
            .then_with(|| a.planet2.cmp(&b.planet2))
            .then_with(|| a.aspect_type.cmp(&b.aspect_type))
    });

    let listed: Vec<String> = significant
        .iter()
        .take(MAX_LISTED_ASPECTS)
        .map(|d| {
            let tone = if d.score > 0.0 { "harmonious" } else { "tense" };
            format!("{} {} {} ({}, {:+.2})", d.planet1, d.aspect_type, d.planet2, tone, d.score)
        })
        .collect();

    format!("Key aspects: {}.", listed.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::elements::element_compatibility;
    use crate::domain::model::{AspectType, CategoryScore, Planet, ZodiacSign};

    fn detail(p1: Planet, p2: Planet, aspect_type: AspectType, score: f64) -> AspectDetail {
        AspectDetail {
            planet1: p1,
            planet2: p2,
            aspect_type,
            score,
        }
    }

    fn questionnaire(total: f64) -> QuestionnaireScore {
        let part = CategoryScore {
            score: total / 100.0,
            weight: 0.25,
        };
        QuestionnaireScore {
            total,
            personality: part,
            lifestyle: part,
            values: part,
            answers: part,
        }
    }

    #[test]
    fn test_combine_total_rounds_and_clamps() {
        assert_eq!(combine_total(60.0, 71.0), 66);
        assert_eq!(combine_total(60.0, 70.0), 65);
        assert_eq!(combine_total(0.0, 0.0), 0);
        assert_eq!(combine_total(100.0, 100.0), 100);
        assert_eq!(combine_total(150.0, 150.0), 100);
        assert_eq!(combine_total(f64::NAN, 10.0), 50);
    }

    #[test]
    fn test_element_wording() {
        let fire = element_compatibility(ZodiacSign::Aries, ZodiacSign::Leo);
        assert!(describe_elements(&fire).contains("harmonious"));

        let mixed = element_compatibility(ZodiacSign::Aries, ZodiacSign::Cancer);
        let text = describe_elements(&mixed);
        assert!(text.contains("friction"));
        assert!(text.contains("difficulties"));
    }

    #[test]
    fn test_aspect_list_is_filtered_ordered_and_capped() {
        let details = vec![
            detail(Planet::Mars, Planet::Venus, AspectType::Square, -0.3),
            detail(Planet::Sun, Planet::Moon, AspectType::Trine, 0.8),
            detail(Planet::Moon, Planet::Sun, AspectType::Opposition, -0.7),
            detail(Planet::Venus, Planet::Venus, AspectType::Conjunction, 0.95),
            detail(Planet::Saturn, Planet::Sun, AspectType::Sextile, 0.5),
            detail(Planet::Jupiter, Planet::Mars, AspectType::Conjunction, 0.6),
            detail(Planet::Mercury, Planet::Mercury, AspectType::Conjunction, 0.55),
        ];
        let text = describe_aspects(&details);
        assert!(text.starts_with("Key aspects: Venus conjunction Venus"));
        assert!(text.contains("Sun trine Moon (harmonious, +0.80)"));
        assert!(text.contains("Moon opposition Sun (tense, -0.70)"));
        assert!(!text.contains("Mars square Venus"));
        // 第六個 (0.5) 被截掉
        assert!(!text.contains("Saturn sextile Sun"));
        assert_eq!(describe_aspects(&[]), "No significant planetary aspects.");
    }

    #[test]
    fn test_combine_is_deterministic() {
        let element = element_compatibility(ZodiacSign::Libra, ZodiacSign::Gemini);
        let aspect = AspectScore {
            aggregate: 0.2,
            normalized: 60.0,
            total: (60.0 + element.score) / 2.0,
            details: vec![detail(Planet::Sun, Planet::Moon, AspectType::Trine, 0.8)],
        };
        let a = combine(questionnaire(64.0), aspect.clone(), element.clone());
        let b = combine(questionnaire(64.0), aspect, element);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        assert!(a.score.total <= 100);
    }

    #[test]
    fn test_astrological_wording() {
        assert!(describe_astrological(82.0).starts_with("Strong"));
        assert!(describe_astrological(50.0).starts_with("Moderate"));
        assert!(describe_astrological(30.0).starts_with("Challenging"));
    }
}
