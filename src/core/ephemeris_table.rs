use crate::domain::model::Planet;
use crate::utils::error::{MatchError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, LazyLock};

/// 內建星曆表：1960–2009 每月 1 日與 15 日 00:00 UTC 的黃經
const BUNDLED_CSV: &str = include_str!("../../data/ephemeris.csv");

static BUNDLED: LazyLock<Arc<PrecomputedEphemeris>> = LazyLock::new(|| {
    match PrecomputedEphemeris::from_reader(BUNDLED_CSV.as_bytes()) {
        Ok(table) => Arc::new(table),
        Err(e) => {
            tracing::error!("❌ Bundled ephemeris table failed to load: {}", e);
            Arc::new(PrecomputedEphemeris::default())
        }
    }
});

#[derive(Debug, Deserialize)]
struct EphemerisRow {
    date: NaiveDate,
    sun: f64,
    moon: f64,
    mercury: f64,
    venus: f64,
    mars: f64,
    jupiter: f64,
    saturn: f64,
}

impl EphemerisRow {
    /// 順序與 `Planet::ALL` 相同
    fn longitudes(&self) -> [f64; 7] {
        [
            self.sun,
            self.moon,
            self.mercury,
            self.venus,
            self.mars,
            self.jupiter,
            self.saturn,
        ]
    }
}

/// 以日期為 key 的預先計算星曆表
#[derive(Debug, Clone, Default)]
pub struct PrecomputedEphemeris {
    rows: BTreeMap<NaiveDate, [f64; 7]>,
}

impl PrecomputedEphemeris {
    pub fn bundled() -> Arc<Self> {
        Arc::clone(&BUNDLED)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// CSV 欄位：date,sun,moon,mercury,venus,mars,jupiter,saturn
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut rows = BTreeMap::new();

        for record in csv_reader.deserialize::<EphemerisRow>() {
            let row = record?;
            let longitudes = row.longitudes();
            if let Some(bad) = longitudes
                .iter()
                .find(|lon| !lon.is_finite() || **lon < 0.0 || **lon >= 360.0)
            {
                return Err(MatchError::ConfigValidationError {
                    field: "ephemeris.table_path".to_string(),
                    message: format!("longitude {} on {} outside [0, 360)", bad, row.date),
                });
            }
            rows.insert(row.date, longitudes);
        }

        tracing::debug!("Loaded precomputed ephemeris with {} dates", rows.len());
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn longitudes(&self, date: NaiveDate) -> Option<Vec<(Planet, f64)>> {
        self.rows
            .get(&date)
            .map(|lons| Planet::ALL.iter().copied().zip(lons.iter().copied()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_table_loads() {
        let table = PrecomputedEphemeris::bundled();
        assert_eq!(table.len(), 1200);

        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let lons = table.longitudes(date).unwrap();
        assert_eq!(lons.len(), 7);
        assert_eq!(lons[0].0, Planet::Sun);
        // 2000-01-01 太陽約在摩羯座 10 度
        assert!((lons[0].1 - 280.0).abs() < 2.0);
    }

    #[test]
    fn test_missing_date_returns_none() {
        let table = PrecomputedEphemeris::bundled();
        assert!(table.longitudes(NaiveDate::from_ymd_opt(1990, 3, 25).unwrap()).is_none());
        assert!(table.longitudes(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()).is_none());
    }

    #[test]
    fn test_custom_table_rejects_bad_longitude() {
        let csv = "date,sun,moon,mercury,venus,mars,jupiter,saturn\n\
                   1990-03-25,4.5,100.0,10.0,320.0,300.0,92.0,360.5\n";
        assert!(PrecomputedEphemeris::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_custom_table_parses() {
        let csv = "date,sun,moon,mercury,venus,mars,jupiter,saturn\n\
                   1990-03-25,4.5,100.0,10.0,320.0,300.0,92.0,294.0\n";
        let table = PrecomputedEphemeris::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        let lons = table
            .longitudes(NaiveDate::from_ymd_opt(1990, 3, 25).unwrap())
            .unwrap();
        assert_eq!(lons[6], (Planet::Saturn, 294.0));
    }
}
