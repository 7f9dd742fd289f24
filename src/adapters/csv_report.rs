use crate::domain::model::RankedMatch;
use crate::utils::error::{MatchError, Result};

/// 排名輸出成 CSV (含標頭)，分數取到小數點後兩位
pub fn ranking_to_csv(ranking: &[RankedMatch]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "rank",
        "candidate_id",
        "total",
        "questionnaire",
        "astrological",
        "element",
        "aspect",
    ])?;

    for (index, row) in ranking.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            row.candidate_id.clone(),
            row.total.to_string(),
            format!("{:.2}", row.questionnaire),
            format!("{:.2}", row.astrological),
            format!("{:.2}", row.element),
            format!("{:.2}", row.aspect),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| MatchError::IoError(e.into_error()))
}
