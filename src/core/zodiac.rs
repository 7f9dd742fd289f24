use crate::domain::model::ZodiacSign;
use chrono::{Datelike, NaiveDate};

/// (start_month, start_day, end_month, end_day, sign)，日期皆包含在內。
/// 摩羯座跨越年底。
const SIGN_RANGES: [(u32, u32, u32, u32, ZodiacSign); 12] = [
    (3, 21, 4, 19, ZodiacSign::Aries),
    (4, 20, 5, 20, ZodiacSign::Taurus),
    (5, 21, 6, 20, ZodiacSign::Gemini),
    (6, 21, 7, 22, ZodiacSign::Cancer),
    (7, 23, 8, 22, ZodiacSign::Leo),
    (8, 23, 9, 22, ZodiacSign::Virgo),
    (9, 23, 10, 22, ZodiacSign::Libra),
    (10, 23, 11, 21, ZodiacSign::Scorpio),
    (11, 22, 12, 21, ZodiacSign::Sagittarius),
    (12, 22, 1, 19, ZodiacSign::Capricorn),
    (1, 20, 2, 18, ZodiacSign::Aquarius),
    (2, 19, 3, 20, ZodiacSign::Pisces),
];

fn in_range(month: u32, day: u32, start: (u32, u32), end: (u32, u32)) -> bool {
    let md = (month, day);
    if start <= end {
        md >= start && md <= end
    } else {
        md >= start || md <= end
    }
}

/// 依月日決定太陽星座
pub fn sun_sign_for(month: u32, day: u32) -> ZodiacSign {
    SIGN_RANGES
        .iter()
        .find(|(sm, sd, em, ed, _)| in_range(month, day, (*sm, *sd), (*em, *ed)))
        .map(|(_, _, _, _, sign)| *sign)
        // 表格涵蓋整年，只有無效月日會走到這裡
        .unwrap_or(ZodiacSign::Capricorn)
}

pub fn sun_sign(date: NaiveDate) -> ZodiacSign {
    sun_sign_for(date.month(), date.day())
}

/// 該星座的起始月日
pub fn sign_start(sign: ZodiacSign) -> (u32, u32) {
    let (sm, sd, _, _, _) = SIGN_RANGES[sign.index()];
    (sm, sd)
}

/// 從星座起始日算起經過的天數 (0-based)
pub fn days_into_sign(date: NaiveDate) -> i64 {
    let sign = sun_sign(date);
    let (sm, sd) = sign_start(sign);
    let mut start_year = date.year();
    if (date.month(), date.day()) < (sm, sd) {
        start_year -= 1;
    }
    NaiveDate::from_ymd_opt(start_year, sm, sd)
        .map(|start| (date - start).num_days())
        .unwrap_or(0)
}
