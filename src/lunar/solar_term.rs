//! The 24 solar terms for 1900–2100.
//!
//! Term dates are tabulated rather than computed at run time. They were
//! derived from the Bretagnon–Simon solar longitude series with ΔT applied
//! and dated in China Standard Time, which keeps terms falling within
//! minutes of midnight on the right calendar day.
//!
//! Each year packs 24 two-bit offsets, term `i` in bits `2i..2i+2`. The
//! term's day of month is `TERM_BASE[i]` plus that offset; term `i` always
//! falls in month `i / 2 + 1`.

use chrono::{Datelike, NaiveDate};

use super::table::{MAX_YEAR, MIN_YEAR};

/// Terms in calendar order; term `i` starts when the sun reaches `285° + 15°·i`.
pub const TERMS: [&str; 24] = [
    "小寒", "大寒", "立春", "雨水", "惊蛰", "春分", "清明", "谷雨", "立夏", "小满", "芒种", "夏至",
    "小暑", "大暑", "立秋", "处暑", "白露", "秋分", "寒露", "霜降", "立冬", "小雪", "大雪", "冬至",
];

const TERM_BASE: [u32; 24] = [
    4, 19, 3, 18, 4, 19, 4, 19, 4, 20, 4, 20, 6, 22, 6, 22, 6, 22, 7, 22, 6, 21, 6, 21,
];

#[rustfmt::skip]
const TERM_INFO: [u64; 201] = [
    0x5aa6_65a6_5a56, 0x6aaa_a6aa_9a5a, 0xaaaa_aaba_aa6a, 0xaaab_babb_afaa, 0x5aa6_65a6_5aab, // 1900
    0x6aaa_a6aa_9a5a, 0xaaaa_aaaa_aa6a, 0xaaab_babb_afaa, 0x5aa6_65a6_5aab, 0x6aaa_a6aa_9a5a, // 1905
    0xaaaa_aaaa_aa6a, 0xaaab_babb_afaa, 0x56a6_65a6_5aab, 0x6aa6_a6aa_9a56, 0xaaaa_aaaa_9a5a, // 1910
    0xaaab_aaba_aeaa, 0x5696_65a6_5aaa, 0x6aa6_a6a6_9a56, 0x6aaa_aaaa_9a5a, 0xaaab_aaba_aeaa, // 1915
    0x5696_65a6_5aaa, 0x5aa6_a6a6_5a56, 0x6aaa_aaaa_9a5a, 0xaaab_aaba_aa6a, 0x5696_65a6_5aaa, // 1920
    0x5aa6_a6a6_5a56, 0x6aaa_a6aa_9a5a, 0xaaab_aaba_aa6a, 0x5556_65a6_5aaa, 0x5aa6_65a6_5a56, // 1925
    0x6aaa_a6aa_9a5a, 0xaaaa_aaba_aa6a, 0x5556_6566_5aaa, 0x5aa6_65a6_5a56, 0x6aaa_a6aa_9a5a, // 1930
    0xaaaa_aaaa_aa6a, 0x5556_6566_5aaa, 0x5aa6_65a6_5a56, 0x6aaa_a6aa_9a5a, 0xaaaa_aaaa_aa6a, // 1935
    0x5556_6566_5aaa, 0x5aa6_65a6_5a56, 0x6aaa_a6aa_9a5a, 0xaaaa_aaaa_aa6a, 0x5556_6565_5aaa, // 1940
    0x5696_65a6_5a56, 0x6aa6_a6aa_9a56, 0xaaaa_aaaa_9a5a, 0x5556_5565_59aa, 0x5696_65a6_5a55, // 1945
    0x6aa6_a6a6_5a56, 0x6aaa_aaaa_9a5a, 0x5556_5565_59aa, 0x5696_65a6_5a55, 0x5aa6_a6a6_5a56, // 1950
    0x6aaa_a6aa_9a5a, 0x5556_5565_55aa, 0x5696_65a6_5a55, 0x5aa6_65a6_5a56, 0x6aaa_a6aa_9a5a, // 1955
    0x5555_5565_556a, 0x5556_6566_5a55, 0x5aa6_65a6_5a56, 0x6aaa_a6aa_9a5a, 0x5555_5565_556a, // 1960
    0x5556_6566_5a55, 0x5aa6_65a6_5a56, 0x6aaa_a6aa_9a5a, 0x5555_5555_556a, 0x5556_6566_5a55, // 1965
    0x5aa6_65a6_5a56, 0x6aaa_a6aa_9a5a, 0x5555_5555_556a, 0x5556_6565_5a55, 0x5aa6_65a6_5a56, // 1970
    0x6aa6_a6aa_9a5a, 0x5555_5555_456a, 0x5556_5565_5a55, 0x5a96_65a6_5a56, 0x6aa6_a6a6_9a56, // 1975
    0x5555_5555_456a, 0x5556_5565_5a55, 0x5696_65a6_5a56, 0x6aa6_a6a6_5a56, 0x5555_5155_455a, // 1980
    0x5556_5565_5955, 0x5696_65a6_5a55, 0x5aa6_a5a6_5a56, 0x1555_5155_455a, 0x5555_5565_5555, // 1985
    0x5696_6566_5a55, 0x5aa6_65a6_5a56, 0x1555_5155_455a, 0x5555_5565_5515, 0x5556_6566_5a55, // 1990
    0x5aa6_65a6_5a56, 0x1555_5155_455a, 0x5555_5555_5515, 0x5556_6566_5a55, 0x5aa6_65a6_5a56, // 1995
    0x1555_5155_455a, 0x5555_5555_5515, 0x5556_6566_5a55, 0x5aa6_65a6_5a56, 0x1555_5155_455a, // 2000
    0x5555_5555_5515, 0x5556_5565_5a55, 0x5aa6_65a6_5a56, 0x1551_5155_455a, 0x5555_5555_4515, // 2005
    0x5556_5565_5a55, 0x5a96_65a6_5a56, 0x1551_5151_455a, 0x5555_5155_4515, 0x5556_5565_5a55, // 2010
    0x5696_65a6_5a56, 0x1551_5151_0556, 0x5555_5155_4505, 0x5556_5565_5955, 0x5696_6566_5a55, // 2015
    0x1551_1051_0556, 0x1555_5155_4505, 0x5555_5565_5555, 0x5696_6566_5a55, 0x0551_1051_0556, // 2020
    0x1555_5155_4505, 0x5555_5555_5515, 0x5556_6566_5a55, 0x0551_1051_0556, 0x1555_5155_4505, // 2025
    0x5555_5555_5515, 0x5556_6566_5a55, 0x0551_1051_0556, 0x1555_5155_4505, 0x5555_5555_5515, // 2030
    0x5556_5565_5a55, 0x0551_1051_0556, 0x1555_5155_4505, 0x5555_5555_5515, 0x5556_5565_5a55, // 2035
    0x0551_1051_0556, 0x1551_5151_4505, 0x5555_5555_4515, 0x5556_5565_5a55, 0x0541_1051_0556, // 2040
    0x1551_5151_0505, 0x5555_5155_4515, 0x5556_5565_5a55, 0x0141_1011_0556, 0x1551_1051_0501, // 2045
    0x5555_5155_4505, 0x5555_5565_5555, 0x0141_1011_0555, 0x1551_1051_0501, 0x5555_5155_4505, // 2050
    0x5555_5555_5555, 0x0141_1011_0555, 0x0551_1051_0501, 0x1555_5155_4505, 0x5555_5555_5555, // 2055
    0x0001_1011_0555, 0x0551_1051_0501, 0x1555_5155_4505, 0x5555_5555_5515, 0x0001_1011_0555, // 2060
    0x0551_1051_0501, 0x1555_5155_4505, 0x5555_5555_5515, 0x0001_0010_0555, 0x0551_1051_0501, // 2065
    0x1551_5151_4505, 0x5555_5555_5515, 0x0001_0010_0555, 0x0541_1051_0501, 0x1551_5151_4505, // 2070
    0x5555_5155_4515, 0x0001_0010_0555, 0x0541_1051_0501, 0x1551_5051_0505, 0x5555_5155_4515, // 2075
    0x0001_0010_0555, 0x0141_1011_0501, 0x1551_1051_0505, 0x5555_5155_4505, 0x0000_0010_0055, // 2080
    0x0141_1011_0500, 0x1551_1051_0501, 0x5555_5155_4505, 0x0000_0000_0055, 0x0141_1011_0500, // 2085
    0x0551_1051_0501, 0x1555_5155_4505, 0x0000_0000_0055, 0x0001_1011_0500, 0x0551_1051_0501, // 2090
    0x1555_5155_4505, 0x0000_0000_0015, 0x0001_0011_0500, 0x0551_1051_0501, 0x1555_5155_4505, // 2095
    0x5555_5555_5515,                                                                        // 2100
];

/// Name of the solar term that begins on `date`, if any.
pub fn solar_term(date: NaiveDate) -> Option<&'static str> {
    // Every Gregorian month holds exactly two terms.
    let first = (date.month0() * 2) as usize;
    (first..first + 2)
        .find(|&i| term_date(date.year(), i) == Some(date))
        .map(|i| TERMS[i])
}

/// Calendar date (UTC+8) on which term `index` of `year` begins.
pub fn term_date(year: i32, index: usize) -> Option<NaiveDate> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) || index >= TERMS.len() {
        return None;
    }
    let packed = TERM_INFO[(year - MIN_YEAR) as usize];
    let offset = ((packed >> (2 * index)) & 0b11) as u32;
    NaiveDate::from_ymd_opt(year, index as u32 / 2 + 1, TERM_BASE[index] + offset)
}
