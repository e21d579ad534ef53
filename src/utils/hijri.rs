use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate};
use hijri_date::HijriDate;

/// Islamic month names as written on the board (index 0 = Muharram = month 1)
const HIJRI_MONTH_NAMES: &[&str] = &[
    "Muharram",
    "Safar",
    "Rabiul Awal",
    "Rabiul Akhir",
    "Jumadil Awal",
    "Jumadil Akhir",
    "Rajab",
    "Syaban",
    "Ramadhan",
    "Syawal",
    "Dzulqaidah",
    "Dzulhijjah",
];

pub fn hijri_month_name(month: usize) -> &'static str {
    if (1..=12).contains(&month) {
        HIJRI_MONTH_NAMES[month - 1]
    } else {
        "Unknown"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HijriInfo {
    pub day: usize,
    pub month: usize,
    pub year: usize,
    pub month_name: String,
}

impl HijriInfo {
    pub fn formatted(&self) -> String {
        format!("{} {} {} H", self.day, self.month_name, self.year)
    }
}

/// Offline conversion, used when the date service cannot be reached.
/// `offset_days` adjusts for local moon sighting (e.g. -1 if the region is
/// one day behind the tabular calendar).
pub fn to_hijri(date: NaiveDate, offset_days: i32) -> Result<HijriInfo> {
    let adjusted = date + Duration::days(offset_days as i64);
    let hd = HijriDate::from_gr(
        adjusted.year() as usize,
        adjusted.month() as usize,
        adjusted.day() as usize,
    )
    .map_err(|e| anyhow::anyhow!("Hijri conversion error: {}", e))?;

    let month = hd.month();
    Ok(HijriInfo {
        day: hd.day(),
        month,
        year: hd.year(),
        month_name: hijri_month_name(month).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_are_one_based() {
        assert_eq!(hijri_month_name(1), "Muharram");
        assert_eq!(hijri_month_name(9), "Ramadhan");
        assert_eq!(hijri_month_name(0), "Unknown");
        assert_eq!(hijri_month_name(13), "Unknown");
    }

    #[test]
    fn offline_conversion_gives_a_plausible_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let info = to_hijri(date, 0).unwrap();
        assert!((1..=12).contains(&info.month));
        assert!((1..=30).contains(&info.day));
        assert!((1447..=1448).contains(&info.year));
        assert_eq!(info.month_name, hijri_month_name(info.month));
    }

    #[test]
    fn formatted_reads_naturally() {
        let info = HijriInfo { day: 1, month: 9, year: 1448, month_name: "Ramadhan".to_string() };
        assert_eq!(info.formatted(), "1 Ramadhan 1448 H");
    }
}
