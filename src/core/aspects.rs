use crate::domain::model::{AspectDetail, AspectScore, AspectType, ElementScore, NatalChart};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectDefinition {
    pub aspect_type: AspectType,
    /// 精確角度
    pub angle: f64,
    /// 容許誤差
    pub orb: f64,
    /// 正值和諧、負值緊張
    pub weight: f64,
}

/// 依序檢查，第一個落在容許誤差內的相位成立
pub const ASPECTS: [AspectDefinition; 5] = [
    AspectDefinition {
        aspect_type: AspectType::Conjunction,
        angle: 0.0,
        orb: 10.0,
        weight: 1.0,
    },
    AspectDefinition {
        aspect_type: AspectType::Sextile,
        angle: 60.0,
        orb: 6.0,
        weight: 0.5,
    },
    AspectDefinition {
        aspect_type: AspectType::Square,
        angle: 90.0,
        orb: 8.0,
        weight: -0.5,
    },
    AspectDefinition {
        aspect_type: AspectType::Trine,
        angle: 120.0,
        orb: 8.0,
        weight: 0.8,
    },
    AspectDefinition {
        aspect_type: AspectType::Opposition,
        angle: 180.0,
        orb: 10.0,
        weight: -0.7,
    },
];

/// 兩個黃經間的最小夾角 [0, 180]
pub fn angular_difference(longitude1: f64, longitude2: f64) -> f64 {
    let diff = (longitude1 - longitude2).abs().rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// 判斷夾角屬於哪個相位，回傳相位與原始分數 [-1, 1]
pub fn classify(angle: f64) -> Option<(AspectType, f64)> {
    ASPECTS.iter().find_map(|def| {
        let deviation = (angle - def.angle).abs();
        (deviation <= def.orb).then(|| (def.aspect_type, (1.0 - deviation / def.orb) * def.weight))
    })
}

/// 兩張星盤所有星體配對中成立的相位
pub fn aspect_details(chart1: &NatalChart, chart2: &NatalChart) -> Vec<AspectDetail> {
    let mut details = Vec::new();
    for (planet1, pos1) in &chart1.planet_positions {
        for (planet2, pos2) in &chart2.planet_positions {
            let angle = angular_difference(pos1.longitude(), pos2.longitude());
            if let Some((aspect_type, score)) = classify(angle) {
                details.push(AspectDetail {
                    planet1: *planet1,
                    planet2: *planet2,
                    aspect_type,
                    score,
                });
            }
        }
    }
    details
}

/// 以星體重要性乘積加權平均。
/// 先排序再加總，交換兩張星盤時結果逐位元相同。
pub fn weighted_aggregate(details: &[AspectDetail]) -> f64 {
    let mut terms: Vec<(f64, f64)> = details
        .iter()
        .map(|d| (d.planet1.significance() * d.planet2.significance(), d.score))
        .collect();
    terms.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.total_cmp(&b.0)));

    let (weighted, total_weight) = terms
        .iter()
        .fold((0.0, 0.0), |(sum, weights), (w, s)| (sum + w * s, weights + w));

    if total_weight > 0.0 {
        (weighted / total_weight).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

pub fn aspect_score(chart1: &NatalChart, chart2: &NatalChart, element: &ElementScore) -> AspectScore {
    let details = aspect_details(chart1, chart2);
    let aggregate = weighted_aggregate(&details);
    let normalized = ((aggregate + 1.0) * 50.0).clamp(0.0, 100.0);

    tracing::debug!(
        "Aspects: {} qualifying pairs, aggregate {:.3}, normalized {:.1}",
        details.len(),
        aggregate,
        normalized
    );

    AspectScore {
        aggregate,
        normalized,
        total: ((normalized + element.score) / 2.0).clamp(0.0, 100.0),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::elements::element_compatibility;
    use crate::core::validator::BirthDataValidator;
    use crate::domain::model::{
        ChartSource, Planet, PlanetPosition, PlanetPositions, RawBirthData, ZodiacSign,
    };

    fn chart_with(longitudes: &[(Planet, f64)]) -> NatalChart {
        let birth = BirthDataValidator::validate(&RawBirthData {
            date: "1990-03-25".to_string(),
            time: "12:00".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            timezone: "UTC".to_string(),
        })
        .unwrap();
        let positions: PlanetPositions = longitudes
            .iter()
            .map(|(p, lon)| (*p, PlanetPosition::from_longitude(*lon, 1)))
            .collect();
        NatalChart {
            birth_data: birth,
            zodiac_sign: ZodiacSign::Aries,
            planet_positions: positions,
            source: ChartSource::StaticDefault,
        }
    }

    #[test]
    fn test_angular_difference_normalizes() {
        assert_eq!(angular_difference(10.0, 350.0), 20.0);
        assert_eq!(angular_difference(350.0, 10.0), 20.0);
        assert_eq!(angular_difference(0.0, 180.0), 180.0);
        assert_eq!(angular_difference(90.0, 90.0), 0.0);
        assert_eq!(angular_difference(30.0, 250.0), 140.0);
    }

    #[test]
    fn test_classify_exact_and_edge() {
        assert_eq!(classify(0.0), Some((AspectType::Conjunction, 1.0)));
        assert_eq!(classify(120.0), Some((AspectType::Trine, 0.8)));
        assert_eq!(classify(180.0), Some((AspectType::Opposition, -0.7)));

        let (kind, score) = classify(94.0).unwrap();
        assert_eq!(kind, AspectType::Square);
        assert!((score - (-0.25)).abs() < 1e-12);

        assert_eq!(classify(66.0), Some((AspectType::Sextile, 0.0)));
        assert_eq!(classify(40.0), None);
        assert_eq!(classify(150.0), None);
    }

    #[test]
    fn test_raw_scores_stay_in_unit_range() {
        let mut angle = 0.0;
        while angle <= 180.0 {
            if let Some((_, score)) = classify(angle) {
                assert!((-1.0..=1.0).contains(&score), "angle={angle}");
            }
            angle += 0.25;
        }
    }

    #[test]
    fn test_weighted_aggregate_uses_significance_product() {
        let a = chart_with(&[(Planet::Sun, 0.0), (Planet::Saturn, 200.0)]);
        let b = chart_with(&[(Planet::Sun, 0.0)]);
        // Sun-Sun 合相 (+1.0, 權重 1.0)，Saturn-Sun 160° 無相位
        let details = aspect_details(&a, &b);
        assert_eq!(details.len(), 1);
        assert_eq!(weighted_aggregate(&details), 1.0);

        let a = chart_with(&[(Planet::Sun, 0.0), (Planet::Jupiter, 90.0)]);
        let details = aspect_details(&a, &b);
        // (1.0 * 1.0 + (-0.5) * 0.7) / 1.7
        let expected = (1.0 - 0.35) / 1.7;
        assert!((weighted_aggregate(&details) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_no_aspects_is_neutral() {
        let a = chart_with(&[(Planet::Sun, 0.0)]);
        let b = chart_with(&[(Planet::Sun, 40.0)]);
        let element = element_compatibility(ZodiacSign::Aries, ZodiacSign::Aries);
        let score = aspect_score(&a, &b, &element);
        assert!(score.details.is_empty());
        assert_eq!(score.aggregate, 0.0);
        assert_eq!(score.normalized, 50.0);
        assert_eq!(score.total, (50.0 + element.score) / 2.0);
    }

    #[test]
    fn test_aspect_score_is_symmetric() {
        let a = chart_with(&[
            (Planet::Sun, 4.0),
            (Planet::Moon, 97.3),
            (Planet::Venus, 333.1),
            (Planet::Mars, 301.7),
        ]);
        let b = chart_with(&[
            (Planet::Sun, 122.0),
            (Planet::Moon, 181.9),
            (Planet::Venus, 62.4),
            (Planet::Mars, 15.5),
        ]);
        let element = element_compatibility(ZodiacSign::Aries, ZodiacSign::Leo);
        let ab = aspect_score(&a, &b, &element);
        let ba = aspect_score(&b, &a, &element);
        assert_eq!(ab.aggregate, ba.aggregate);
        assert_eq!(ab.total, ba.total);
        assert_eq!(ab.details.len(), ba.details.len());
    }
}
