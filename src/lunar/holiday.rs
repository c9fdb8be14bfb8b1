use chrono::NaiveDate;

use super::{CalendarError, lunar_to_solar, solar_to_lunar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Holiday {
    pub name: &'static str,
    pub month: u32,
    pub day: u32,
}

const fn holiday(name: &'static str, month: u32, day: u32) -> Holiday {
    Holiday { name, month, day }
}

/// Lunar holidays in display order.
pub const HOLIDAYS: [Holiday; 9] = [
    holiday("春节", 1, 1),
    holiday("元宵节", 1, 15),
    holiday("端午节", 5, 5),
    holiday("七夕节", 7, 7),
    holiday("中秋节", 8, 15),
    holiday("重阳节", 9, 9),
    holiday("腊八节", 12, 8),
    holiday("小年", 12, 23),
    holiday("除夕", 12, 30),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub name: &'static str,
    pub days: i64,
}

impl Countdown {
    pub fn is_today(&self) -> bool {
        self.days == 0
    }
}

/// Days from `today` until the next occurrence of each holiday.
///
/// Output keeps the order of `holidays` and is cut to `limit` entries; it is
/// not sorted by proximity. Holidays that do not exist in the relevant lunar
/// year (除夕 in a year whose last month has 29 days) are skipped.
pub fn upcoming_countdowns(
    today: NaiveDate,
    holidays: &[Holiday],
    limit: usize,
) -> Result<Vec<Countdown>, CalendarError> {
    let lunar_year = solar_to_lunar(today)?.year;

    let countdowns = holidays
        .iter()
        .filter_map(|h| match next_occurrence(today, lunar_year, h) {
            Ok(date) => Some(Countdown {
                name: h.name,
                days: (date - today).num_days(),
            }),
            Err(e) => {
                tracing::debug!("Skipping {}: {e}", h.name);
                None
            }
        })
        .filter(|c| c.days >= 0)
        .take(limit)
        .collect();
    Ok(countdowns)
}

fn next_occurrence(
    today: NaiveDate,
    lunar_year: i32,
    holiday: &Holiday,
) -> Result<NaiveDate, CalendarError> {
    let this_year = lunar_to_solar(lunar_year, holiday.month, holiday.day, false)?;
    if this_year >= today {
        return Ok(this_year);
    }
    lunar_to_solar(lunar_year + 1, holiday.month, holiday.day, false)
}
