use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::lunar::Countdown;
use crate::quote::Quote;
use crate::weather::WeatherSnapshot;

const WEEKDAYS: [&str; 7] = ["周日", "周一", "周二", "周三", "周四", "周五", "周六"];
const NO_HOLIDAYS: &str = "近期无节日";

// --- Wire types ---

#[derive(Debug, Clone, Serialize)]
pub struct TemplateMessage {
    pub touser: String,
    pub template_id: String,
    pub url: String,
    pub data: BTreeMap<String, TemplateField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateField {
    pub value: String,
}

impl TemplateMessage {
    pub fn new(touser: &str, template_id: &str, url: &str) -> Self {
        Self {
            touser: touser.to_string(),
            template_id: template_id.to_string(),
            url: url.to_string(),
            data: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(
            name.into(),
            TemplateField {
                value: value.into(),
            },
        );
        self
    }
}

// --- Composition ---

/// Everything gathered upstream that goes into one day's message.
pub struct Digest {
    pub today: NaiveDate,
    pub region: String,
    pub weather: WeatherSnapshot,
    pub lunar: String,
    pub countdowns: Vec<Countdown>,
    pub holiday_slots: usize,
    pub quote: Quote,
}

impl Digest {
    pub fn to_message(&self, touser: &str, template_id: &str, link: &str) -> TemplateMessage {
        let mut message = TemplateMessage::new(touser, template_id, link)
            .field("date", format_date(self.today))
            .field("region", &self.region)
            .field("weather", self.weather.conditions())
            .field("temperature", self.weather.temperature())
            .field("lunar_date", &self.lunar)
            .field("quote_cn", &self.quote.translated)
            .field("quote_en", &self.quote.original);

        for slot in 0..self.holiday_slots {
            let text = match self.countdowns.get(slot) {
                Some(c) => format_countdown(c),
                None if slot == 0 => NO_HOLIDAYS.to_string(),
                None => String::new(),
            };
            message = message.field(format!("holiday{}", slot + 1), text);
        }
        message
    }
}

pub fn format_date(date: NaiveDate) -> String {
    format!(
        "{} {}",
        date.format("%Y年%m月%d日"),
        WEEKDAYS[date.weekday().num_days_from_sunday() as usize]
    )
}

pub fn format_countdown(countdown: &Countdown) -> String {
    if countdown.is_today() {
        format!("🎉 今天是{}", countdown.name)
    } else {
        format!("⏰ 距离{}还有{}天", countdown.name, countdown.days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl TemplateMessage {
        fn value(&self, name: &str) -> Option<&str> {
            self.data.get(name).map(|f| f.value.as_str())
        }
    }

    fn digest(countdowns: Vec<Countdown>) -> Digest {
        Digest {
            today: NaiveDate::from_ymd_opt(2024, 2, 8).unwrap(),
            region: "北京".to_string(),
            weather: WeatherSnapshot {
                temp_min: "-3".to_string(),
                temp_max: "6".to_string(),
                text_day: "晴".to_string(),
                text_night: "多云".to_string(),
            },
            lunar: "二零二三年腊月廿九 癸卯年 兔年".to_string(),
            countdowns,
            holiday_slots: 3,
            quote: Quote::fallback(),
        }
    }

    #[test]
    fn test_format_date_weekday() {
        // 2024-02-08 is a Thursday, 2024-02-11 a Sunday.
        assert_eq!(
            format_date(NaiveDate::from_ymd_opt(2024, 2, 8).unwrap()),
            "2024年02月08日 周四"
        );
        assert_eq!(
            format_date(NaiveDate::from_ymd_opt(2024, 2, 11).unwrap()),
            "2024年02月11日 周日"
        );
    }

    #[test]
    fn test_format_countdown() {
        let today = Countdown { name: "春节", days: 0 };
        let later = Countdown { name: "元宵节", days: 14 };
        assert_eq!(format_countdown(&today), "🎉 今天是春节");
        assert_eq!(format_countdown(&later), "⏰ 距离元宵节还有14天");
    }

    #[test]
    fn test_message_fields() {
        let msg = digest(vec![
            Countdown { name: "春节", days: 2 },
            Countdown { name: "元宵节", days: 16 },
        ])
        .to_message("openid", "tpl", "https://github.com");

        assert_eq!(msg.touser, "openid");
        assert_eq!(msg.template_id, "tpl");
        assert_eq!(msg.url, "https://github.com");
        assert_eq!(msg.value("date"), Some("2024年02月08日 周四"));
        assert_eq!(msg.value("region"), Some("北京"));
        assert_eq!(msg.value("weather"), Some("晴转多云"));
        assert_eq!(msg.value("temperature"), Some("-3~6°C"));
        assert_eq!(msg.value("holiday1"), Some("⏰ 距离春节还有2天"));
        assert_eq!(msg.value("holiday2"), Some("⏰ 距离元宵节还有16天"));
        assert_eq!(msg.value("holiday3"), Some(""));
        assert_eq!(msg.value("holiday4"), None);
        assert_eq!(msg.value("quote_cn"), Some("对明天最好的准备就是今天做到最好"));
    }

    #[test]
    fn test_no_countdowns_placeholder() {
        let msg = digest(vec![]).to_message("openid", "tpl", "https://github.com");
        assert_eq!(msg.value("holiday1"), Some(NO_HOLIDAYS));
        assert_eq!(msg.value("holiday2"), Some(""));
    }

    #[test]
    fn test_wire_shape() {
        let msg = TemplateMessage::new("o", "t", "u").field("region", "北京");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "touser": "o",
                "template_id": "t",
                "url": "u",
                "data": { "region": { "value": "北京" } }
            })
        );
    }
}
