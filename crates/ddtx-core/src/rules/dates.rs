//! Date extraction for document headers and filenames.

use chrono::{Datelike, NaiveDate};

use super::patterns::{DATE_DMY, FILENAME_DATE};
use super::{ExtractionMatch, FieldExtractor};

/// Date field extractor for `DD/MM/YY` and `DD/MM/YYYY` forms.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in DATE_DMY.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year = expand_year(&caps[3]);

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                let full_match = caps.get(0).unwrap();
                results.push(
                    ExtractionMatch::new(date, 0.9, full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                );
            }
        }

        results
    }
}

/// Extract a date from filename tokens like `21-05-25` or `21_05_2025`.
/// Digit triples that do not form a calendar date are passed over.
pub fn date_from_filename(filename: &str) -> Option<NaiveDate> {
    FILENAME_DATE.captures_iter(filename).find_map(|caps| {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = expand_year(&caps[3]);
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Expand a 2-digit year to 2000+YY; pass 4-digit years through.
pub fn expand_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 { 2000 + year } else { year }
}

/// Whether a date is plausible as a document date: not in the future
/// relative to the reference date, and not older than `max_age_years`.
pub fn within_window(date: NaiveDate, reference: NaiveDate, max_age_years: i32) -> bool {
    if date > reference {
        return false;
    }
    let floor_year = reference.year() - max_age_years;
    let floor = reference
        .with_year(floor_year)
        // Feb 29 references fall back to Feb 28
        .or_else(|| reference.with_day(28).and_then(|d| d.with_year(floor_year)))
        .unwrap_or(reference);
    date >= floor
}
