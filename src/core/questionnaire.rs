use crate::core::validator::{MAX_RATING, MIN_RATING};
use crate::domain::model::{CategoryScore, QuestionnaireProfile, QuestionnaireScore};
use std::collections::BTreeMap;

/// 沒有可比較資料時的中性分數
pub const NEUTRAL_SIMILARITY: f64 = 50.0;

/// 四部分加權平均：三組評分 + 選擇題
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedFourPart {
    pub personality: f64,
    pub values: f64,
    pub lifestyle: f64,
    pub answers: f64,
}

impl Default for WeightedFourPart {
    fn default() -> Self {
        Self {
            personality: 0.30,
            values: 0.30,
            lifestyle: 0.20,
            answers: 0.20,
        }
    }
}

/// 兩組 1..=10 評分的相似度 (0..100)，只比較雙方都有的 key
pub fn rating_similarity(a: &BTreeMap<String, u8>, b: &BTreeMap<String, u8>) -> f64 {
    let max_diff = u32::from(MAX_RATING - MIN_RATING);
    let (total_diff, compared) = a
        .iter()
        .filter_map(|(key, v1)| b.get(key).map(|v2| u32::from(v1.abs_diff(*v2))))
        .fold((0u32, 0u32), |(sum, n), diff| (sum + diff, n + 1));

    if compared == 0 {
        return NEUTRAL_SIMILARITY;
    }

    let possible = f64::from(max_diff * compared);
    (100.0 * (1.0 - f64::from(total_diff) / possible)).clamp(0.0, 100.0)
}

/// 選擇題完全相同的比例 (0..100)，空白答案視為未作答
pub fn categorical_similarity(a: &BTreeMap<String, String>, b: &BTreeMap<String, String>) -> f64 {
    let (matches, compared) = a
        .iter()
        .filter(|(_, answer)| !answer.trim().is_empty())
        .filter_map(|(key, answer)| {
            b.get(key)
                .filter(|other| !other.trim().is_empty())
                .map(|other| answer.trim() == other.trim())
        })
        .fold((0u32, 0u32), |(hits, n), same| (hits + u32::from(same), n + 1));

    if compared == 0 {
        return NEUTRAL_SIMILARITY;
    }
    100.0 * f64::from(matches) / f64::from(compared)
}

#[derive(Debug, Clone, Default)]
pub struct QuestionnaireScorer {
    weights: WeightedFourPart,
}

impl QuestionnaireScorer {
    pub fn new(weights: WeightedFourPart) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> WeightedFourPart {
        self.weights
    }

    pub fn score(&self, a: &QuestionnaireProfile, b: &QuestionnaireProfile) -> QuestionnaireScore {
        let w = self.weights;
        let personality = rating_similarity(&a.personality, &b.personality);
        let values = rating_similarity(&a.values, &b.values);
        let lifestyle = rating_similarity(&a.lifestyle, &b.lifestyle);
        let answers = categorical_similarity(&a.answers, &b.answers);

        let weight_sum = w.personality + w.values + w.lifestyle + w.answers;
        let weighted = personality * w.personality
            + values * w.values
            + lifestyle * w.lifestyle
            + answers * w.answers;
        let total = if weight_sum > 0.0 {
            (weighted / weight_sum).clamp(0.0, 100.0)
        } else {
            NEUTRAL_SIMILARITY
        };

        tracing::debug!(
            "Questionnaire: personality {:.1}, values {:.1}, lifestyle {:.1}, answers {:.1} => {:.1}",
            personality,
            values,
            lifestyle,
            answers,
            total
        );

        QuestionnaireScore {
            total,
            personality: CategoryScore {
                score: personality / 100.0,
                weight: w.personality,
            },
            lifestyle: CategoryScore {
                score: lifestyle / 100.0,
                weight: w.lifestyle,
            },
            values: CategoryScore {
                score: values / 100.0,
                weight: w.values,
            },
            answers: CategoryScore {
                score: answers / 100.0,
                weight: w.answers,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings(pairs: &[(&str, u8)]) -> BTreeMap<String, u8> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_disjoint_keys_are_exactly_neutral() {
        let a = ratings(&[("openness", 8), ("humor", 3)]);
        let b = ratings(&[("patience", 2)]);
        assert_eq!(rating_similarity(&a, &b), 50.0);
        assert_eq!(rating_similarity(&BTreeMap::new(), &BTreeMap::new()), 50.0);
        assert_eq!(categorical_similarity(&BTreeMap::new(), &answers(&[("smoking", "no")])), 50.0);
    }

    #[test]
    fn test_rating_similarity_extremes() {
        let a = ratings(&[("openness", 1), ("humor", 10)]);
        let b = ratings(&[("openness", 10), ("humor", 1)]);
        assert_eq!(rating_similarity(&a, &b), 0.0);
        assert_eq!(rating_similarity(&a, &a), 100.0);

        // |7-4| = 3，共 9 分可能差距
        let c = ratings(&[("openness", 7), ("extra", 2)]);
        let d = ratings(&[("openness", 4)]);
        let expected = 100.0 * (1.0 - 3.0 / 9.0);
        assert!((rating_similarity(&c, &d) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_categorical_skips_blank_answers() {
        let a = answers(&[("smoking", "no"), ("drinking", "social"), ("religion", "")]);
        let b = answers(&[("smoking", "no"), ("drinking", "never"), ("religion", "none")]);
        assert_eq!(categorical_similarity(&a, &b), 50.0);
        assert_eq!(categorical_similarity(&b, &a), 50.0);
    }

    #[test]
    fn test_four_part_weights() {
        let a = QuestionnaireProfile {
            personality: ratings(&[("openness", 5)]),
            values: ratings(&[("family", 5)]),
            lifestyle: ratings(&[("fitness", 1)]),
            answers: answers(&[("smoking", "no")]),
        };
        let b = QuestionnaireProfile {
            personality: ratings(&[("openness", 5)]),
            values: ratings(&[("family", 5)]),
            lifestyle: ratings(&[("fitness", 10)]),
            answers: answers(&[("smoking", "yes")]),
        };
        let score = QuestionnaireScorer::default().score(&a, &b);
        // 100*0.3 + 100*0.3 + 0*0.2 + 0*0.2
        assert!((score.total - 60.0).abs() < 1e-9);
        assert_eq!(score.personality.score, 1.0);
        assert_eq!(score.lifestyle.score, 0.0);
        assert_eq!(score.values.weight, 0.30);
        assert_eq!(score.answers.weight, 0.20);
    }

    #[test]
    fn test_score_is_symmetric() {
        let a = QuestionnaireProfile {
            personality: ratings(&[("openness", 9), ("humor", 4), ("calm", 6)]),
            values: ratings(&[("family", 7)]),
            lifestyle: ratings(&[("fitness", 2), ("travel", 8)]),
            answers: answers(&[("smoking", "no"), ("politics", "left")]),
        };
        let b = QuestionnaireProfile {
            personality: ratings(&[("openness", 3), ("humor", 5)]),
            values: ratings(&[("family", 10), ("career", 4)]),
            lifestyle: ratings(&[("travel", 5)]),
            answers: answers(&[("smoking", "no"), ("politics", "right")]),
        };
        let scorer = QuestionnaireScorer::default();
        assert_eq!(scorer.score(&a, &b), scorer.score(&b, &a));
    }

    #[test]
    fn test_empty_profiles_are_neutral() {
        let empty = QuestionnaireProfile::default();
        let score = QuestionnaireScorer::default().score(&empty, &empty);
        assert!((score.total - 50.0).abs() < 1e-9);
    }
}
