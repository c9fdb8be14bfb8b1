pub mod holiday;
pub mod solar_term;
mod table;

use std::fmt;

use chrono::{Days, NaiveDate};
use thiserror::Error;

pub use holiday::{Countdown, HOLIDAYS, upcoming_countdowns};
pub use solar_term::solar_term;

const ZODIAC: [&str; 12] = [
    "鼠", "牛", "虎", "兔", "龙", "蛇", "马", "羊", "猴", "鸡", "狗", "猪",
];
const STEMS: [&str; 10] = ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"];
const BRANCHES: [&str; 12] = [
    "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
];
/// Year 4 is a 甲子 (rat) year.
const CYCLE_REFERENCE_YEAR: i32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("date {date} is outside the supported lunar calendar range")]
    OutOfRange { date: NaiveDate },
    #[error("lunar date {year}-{}{month}-{day} does not exist", leap_prefix(.is_leap))]
    InvalidLunarDate {
        year: i32,
        month: u32,
        day: u32,
        is_leap: bool,
    },
}

fn leap_prefix(is_leap: &bool) -> &'static str {
    if *is_leap { "leap " } else { "" }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LunarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub is_leap: bool,
}

/// Solar date of lunar 1900-01-01.
fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 31).expect("lunar epoch is a valid date")
}

pub fn solar_to_lunar(date: NaiveDate) -> Result<LunarDate, CalendarError> {
    let out_of_range = CalendarError::OutOfRange { date };
    let mut offset = date.signed_duration_since(epoch()).num_days();
    if offset < 0 {
        return Err(out_of_range);
    }

    let mut year = table::MIN_YEAR;
    loop {
        if !table::contains(year) {
            return Err(out_of_range);
        }
        let days = table::year_days(year);
        if offset < days {
            break;
        }
        offset -= days;
        year += 1;
    }

    let leap = table::leap_month(year);
    let mut month = 1;
    let mut is_leap = false;
    loop {
        let days = table::month_days(year, month);
        if offset < days {
            break;
        }
        offset -= days;
        if month == leap {
            let leap_days = table::leap_month_days(year);
            if offset < leap_days {
                is_leap = true;
                break;
            }
            offset -= leap_days;
        }
        month += 1;
    }

    Ok(LunarDate {
        year,
        month,
        day: offset as u32 + 1,
        is_leap,
    })
}

pub fn lunar_to_solar(
    year: i32,
    month: u32,
    day: u32,
    is_leap: bool,
) -> Result<NaiveDate, CalendarError> {
    let invalid = CalendarError::InvalidLunarDate {
        year,
        month,
        day,
        is_leap,
    };
    if !table::contains(year) || !(1..=12).contains(&month) {
        return Err(invalid);
    }
    let leap = table::leap_month(year);
    if is_leap && leap != month {
        return Err(invalid);
    }
    let max_day = if is_leap {
        table::leap_month_days(year)
    } else {
        table::month_days(year, month)
    };
    if day == 0 || i64::from(day) > max_day {
        return Err(invalid);
    }

    let mut offset: i64 = (table::MIN_YEAR..year).map(table::year_days).sum();
    for m in 1..month {
        offset += table::month_days(year, m);
        if m == leap {
            offset += table::leap_month_days(year);
        }
    }
    if is_leap {
        offset += table::month_days(year, month);
    }
    offset += i64::from(day) - 1;

    epoch()
        .checked_add_days(Days::new(offset as u64))
        .ok_or(invalid)
}

pub fn zodiac(lunar_year: i32) -> &'static str {
    ZODIAC[(lunar_year - CYCLE_REFERENCE_YEAR).rem_euclid(12) as usize]
}

/// Sexagenary (stem-branch) name of a lunar year, e.g. 甲辰 for 2024.
pub fn ganzhi(lunar_year: i32) -> String {
    let n = lunar_year - CYCLE_REFERENCE_YEAR;
    format!(
        "{}{}",
        STEMS[n.rem_euclid(10) as usize],
        BRANCHES[n.rem_euclid(12) as usize]
    )
}

// --- Chinese rendering ---

fn chinese_year(year: i32) -> String {
    const DIGITS: [char; 10] = ['零', '一', '二', '三', '四', '五', '六', '七', '八', '九'];
    year.to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| DIGITS[d as usize])
        .collect()
}

fn chinese_month(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "正", "二", "三", "四", "五", "六", "七", "八", "九", "十", "冬", "腊",
    ];
    MONTHS[(month as usize - 1) % 12]
}

fn chinese_day(day: u32) -> String {
    const UNITS: [&str; 10] = ["", "一", "二", "三", "四", "五", "六", "七", "八", "九"];
    match day {
        10 => "初十".to_string(),
        20 => "二十".to_string(),
        30 => "三十".to_string(),
        1..=9 => format!("初{}", UNITS[day as usize]),
        11..=19 => format!("十{}", UNITS[day as usize - 10]),
        21..=29 => format!("廿{}", UNITS[day as usize - 20]),
        _ => day.to_string(),
    }
}

impl fmt::Display for LunarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}年{}{}月{} {}年",
            chinese_year(self.year),
            if self.is_leap { "闰" } else { "" },
            chinese_month(self.month),
            chinese_day(self.day),
            ganzhi(self.year)
        )
    }
}

/// One-line lunar summary for `today`: date, solar term if any, zodiac year.
pub fn describe(today: NaiveDate) -> Result<String, CalendarError> {
    let lunar = solar_to_lunar(today)?;
    let mut text = lunar.to_string();
    if let Some(term) = solar_term(today) {
        text.push(' ');
        text.push_str(term);
    }
    text.push_str(&format!(" {}年", zodiac(lunar.year)));
    Ok(text)
}
