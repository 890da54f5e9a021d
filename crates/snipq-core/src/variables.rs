//! Contextual values for placeholders that no parameter or default binds.
//!
//! The resolver is handed an already-captured [`VariableContext`] and the
//! settings; it never reads the clock, clipboard or environment itself.
//! Random values (`uuid`, `random`) are drawn when the context is built.

use crate::config::Settings;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, Locale, Offset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::warn;
use uuid::Uuid;

const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
/// Upper bound, inclusive, of `{{random}}`
pub const RANDOM_MAX: u32 = 100;

/// Values captured from the environment before a render starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableContext {
    pub now: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clipboard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    #[serde(default = "Uuid::new_v4")]
    pub uuid: Uuid,
    #[serde(default = "roll_random")]
    pub random: u32,
}

impl VariableContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            clipboard: None,
            app_id: None,
            extra: BTreeMap::new(),
            uuid: Uuid::new_v4(),
            random: roll_random(),
        }
    }
}

/// Draw in `0..=RANDOM_MAX` from v4 entropy
fn roll_random() -> u32 {
    (Uuid::new_v4().as_u128() % (u128::from(RANDOM_MAX) + 1)) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Local,
    Fixed(FixedOffset),
    /// IANA database name such as `Asia/Ho_Chi_Minh`
    Named(Tz),
}

impl Zone {
    /// `Local`/empty, `UTC`/`GMT`/`Z`, offsets like `+07:00`, `-0530`,
    /// `UTC+7`, or an IANA zone name
    pub fn parse(name: &str) -> Option<Zone> {
        let name = name.trim();
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "" | "LOCAL" => return Some(Zone::Local),
            "UTC" | "GMT" | "Z" => return Some(Zone::Fixed(Utc.fix())),
            _ => {}
        }

        let offset = upper
            .strip_prefix("UTC")
            .or_else(|| upper.strip_prefix("GMT"))
            .unwrap_or(&upper);
        if let Some(offset) = parse_offset(offset) {
            return Some(Zone::Fixed(offset));
        }
        name.parse::<Tz>().ok().map(Zone::Named)
    }

    fn offset_at(&self, now: DateTime<Utc>) -> FixedOffset {
        match self {
            Zone::Local => *now.with_timezone(&Local).offset(),
            Zone::Fixed(offset) => *offset,
            Zone::Named(tz) => now.with_timezone(tz).offset().fix(),
        }
    }
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, digits) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };
    if hours.is_empty() || hours.len() > 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Map BCP-47 or POSIX locale tags onto chrono's locale tables
pub fn parse_locale(tag: &str) -> Option<Locale> {
    let normalized = tag.trim().replace('-', "_");
    let locale = match normalized.as_str() {
        "en" | "en_US" => Locale::en_US,
        "en_GB" => Locale::en_GB,
        "fr" | "fr_FR" => Locale::fr_FR,
        "de" | "de_DE" => Locale::de_DE,
        "es" | "es_ES" => Locale::es_ES,
        "it" | "it_IT" => Locale::it_IT,
        "pt" | "pt_BR" => Locale::pt_BR,
        "nl" | "nl_NL" => Locale::nl_NL,
        "ru" | "ru_RU" => Locale::ru_RU,
        "ja" | "ja_JP" => Locale::ja_JP,
        "zh" | "zh_CN" => Locale::zh_CN,
        "ko" | "ko_KR" => Locale::ko_KR,
        "vi" | "vi_VN" => Locale::vi_VN,
        "C" | "POSIX" => Locale::POSIX,
        _ => return None,
    };
    Some(locale)
}

/// Accept strftime (anything containing `%`) or a Go-style reference layout
pub fn to_strftime(layout: &str) -> String {
    if layout.contains('%') {
        return layout.to_string();
    }

    // Longer tokens first so `2006` wins over `2` and `January` over `Jan`.
    const TOKENS: &[(&str, &str)] = &[
        ("January", "%B"),
        ("Jan", "%b"),
        ("Monday", "%A"),
        ("Mon", "%a"),
        ("MST", "%Z"),
        ("2006", "%Y"),
        ("-07:00", "%:z"),
        ("Z07:00", "%:z"),
        ("-0700", "%z"),
        (".000", "%.3f"),
        ("01", "%m"),
        ("02", "%d"),
        ("_2", "%e"),
        ("03", "%I"),
        ("04", "%M"),
        ("05", "%S"),
        ("06", "%y"),
        ("15", "%H"),
        ("PM", "%p"),
        ("pm", "%P"),
        ("1", "%-m"),
        ("2", "%-d"),
        ("3", "%-I"),
        ("4", "%-M"),
        ("5", "%-S"),
    ];

    let mut out = String::with_capacity(layout.len() + 8);
    let mut rest = layout;
    'scan: while let Some(c) = rest.chars().next() {
        for (token, pattern) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(pattern);
                rest = tail;
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

pub struct VariableResolver<'a> {
    settings: &'a Settings,
    context: &'a VariableContext,
    local_now: DateTime<FixedOffset>,
    locale: Locale,
}

impl<'a> VariableResolver<'a> {
    pub fn new(settings: &'a Settings, context: &'a VariableContext) -> Self {
        let zone = Zone::parse(&settings.timezone).unwrap_or_else(|| {
            warn!(timezone = %settings.timezone, "Unknown timezone, using local time");
            Zone::Local
        });
        let locale = parse_locale(&settings.locale).unwrap_or_else(|| {
            warn!(locale = %settings.locale, "Unsupported locale, using POSIX names");
            Locale::POSIX
        });
        let local_now = context.now.with_timezone(&zone.offset_at(context.now));

        Self {
            settings,
            context,
            local_now,
            locale,
        }
    }

    /// Value of a built-in or injected variable, if `name` is one.
    ///
    /// `format` is the bound `format` parameter, honoured by `date`.
    pub fn resolve(&self, name: &str, format: Option<&str>) -> Option<String> {
        let date_format = &self.settings.default_date_format;
        let value = match name {
            "date" => self.format_now(format.unwrap_or(date_format)),
            "time" => self.format_now(TIME_FORMAT),
            "datetime" => self.format_now(&format!("{} {}", to_strftime(date_format), TIME_FORMAT)),
            "weekday" => self.format_now("%A"),
            "month" => self.format_now("%B"),
            "year" => self.format_now("%Y"),
            "iso" => self.local_now.to_rfc3339(),
            "timestamp" => self.context.now.timestamp().to_string(),
            "locale" => self.settings.locale.clone(),
            "timezone" => self.settings.timezone.clone(),
            "dateFormat" => date_format.clone(),
            "clipboard" => return self.context.clipboard.clone(),
            "app" => return self.context.app_id.clone(),
            "uuid" => self.context.uuid.hyphenated().to_string(),
            "random" => self.context.random.to_string(),
            _ => return self.context.extra.get(name).cloned(),
        };
        Some(value)
    }

    fn format_now(&self, layout: &str) -> String {
        let pattern = to_strftime(layout);
        format_localized(&self.local_now, &pattern, self.locale).unwrap_or_else(|| {
            warn!(format = %layout, "Invalid date format, using ISO date");
            self.local_now.format(FALLBACK_DATE_FORMAT).to_string()
        })
    }
}

fn format_localized(dt: &DateTime<FixedOffset>, pattern: &str, locale: Locale) -> Option<String> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", dt.format_localized(pattern, locale)).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn context() -> VariableContext {
        // Monday 2024-03-04 09:05:07 UTC
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 9, 5, 7).unwrap();
        VariableContext::new(now)
    }

    fn utc_settings() -> Settings {
        Settings {
            timezone: "UTC".into(),
            ..Settings::default()
        }
    }

    #[test]
    fn translates_go_layouts() {
        assert_eq!(to_strftime("2006-01-02"), "%Y-%m-%d");
        assert_eq!(to_strftime("Monday, January 2, 2006"), "%A, %B %-d, %Y");
        assert_eq!(to_strftime("15:04:05"), "%H:%M:%S");
        assert_eq!(to_strftime("%d/%m/%Y"), "%d/%m/%Y");
    }

    #[test]
    fn resolves_dates_in_configured_zone() {
        let settings = utc_settings();
        let ctx = context();
        let resolver = VariableResolver::new(&settings, &ctx);
        assert_eq!(resolver.resolve("date", None).as_deref(), Some("2024-03-04"));
        assert_eq!(resolver.resolve("time", None).as_deref(), Some("09:05"));
        assert_eq!(resolver.resolve("weekday", None).as_deref(), Some("Monday"));
        assert_eq!(resolver.resolve("month", None).as_deref(), Some("March"));
        assert_eq!(resolver.resolve("timestamp", None).as_deref(), Some("1709543107"));

        let plus_seven = Settings {
            timezone: "+07:00".into(),
            ..Settings::default()
        };
        let resolver = VariableResolver::new(&plus_seven, &ctx);
        assert_eq!(resolver.resolve("time", None).as_deref(), Some("16:05"));
        assert_eq!(
            resolver.resolve("iso", None).as_deref(),
            Some("2024-03-04T16:05:07+07:00")
        );
    }

    #[test]
    fn bound_format_overrides_date_format() {
        let settings = utc_settings();
        let ctx = context();
        let resolver = VariableResolver::new(&settings, &ctx);
        assert_eq!(
            resolver.resolve("date", Some("Mon, 02 Jan 2006")).as_deref(),
            Some("Mon, 04 Mar 2024")
        );
        assert_eq!(
            resolver.resolve("datetime", None).as_deref(),
            Some("2024-03-04 09:05")
        );
    }

    #[test]
    fn localizes_names() {
        let settings = Settings {
            locale: "fr-FR".into(),
            ..utc_settings()
        };
        let ctx = context();
        let resolver = VariableResolver::new(&settings, &ctx);
        assert_eq!(resolver.resolve("month", None).as_deref(), Some("mars"));
    }

    #[test]
    fn invalid_format_falls_back_to_iso_date() {
        let settings = Settings {
            default_date_format: "%Q%".into(),
            ..utc_settings()
        };
        let ctx = context();
        let resolver = VariableResolver::new(&settings, &ctx);
        assert_eq!(resolver.resolve("date", None).as_deref(), Some("2024-03-04"));
    }

    #[test]
    fn injected_values_and_unknown_names() {
        let settings = utc_settings();
        let mut ctx = context();
        ctx.clipboard = Some("copied".into());
        ctx.extra.insert("user".into(), "ana".into());
        let resolver = VariableResolver::new(&settings, &ctx);
        assert_eq!(resolver.resolve("clipboard", None).as_deref(), Some("copied"));
        assert_eq!(resolver.resolve("user", None).as_deref(), Some("ana"));
        assert_eq!(resolver.resolve("app", None), None);
        assert_eq!(resolver.resolve("nothing", None), None);
        assert_eq!(resolver.resolve("locale", None).as_deref(), Some("en-US"));
    }

    #[test]
    fn parses_zones() {
        assert_eq!(Zone::parse("Local"), Some(Zone::Local));
        assert_eq!(Zone::parse(""), Some(Zone::Local));
        let fixed = |secs| Some(Zone::Fixed(FixedOffset::east_opt(secs).unwrap()));
        assert_eq!(Zone::parse("UTC"), fixed(0));
        assert_eq!(Zone::parse("+07:00"), fixed(7 * 3600));
        assert_eq!(Zone::parse("-0530"), fixed(-(5 * 3600 + 30 * 60)));
        assert_eq!(Zone::parse("UTC+7"), fixed(7 * 3600));
        assert_eq!(Zone::parse("utc+7"), fixed(7 * 3600));
        assert_eq!(Zone::parse("gmt-05:30"), fixed(-(5 * 3600 + 30 * 60)));
        assert_eq!(
            Zone::parse("Europe/Paris"),
            Some(Zone::Named(chrono_tz::Europe::Paris))
        );
        assert_eq!(Zone::parse("Mars/Olympus_Mons"), None);
        assert_eq!(Zone::parse("+7:99"), None);
    }

    #[test]
    fn named_zone_crosses_date_line() {
        let settings = Settings {
            timezone: "Asia/Ho_Chi_Minh".into(),
            ..Settings::default()
        };
        let ctx = VariableContext::new(Utc.with_ymd_and_hms(2024, 3, 4, 20, 0, 0).unwrap());
        let resolver = VariableResolver::new(&settings, &ctx);
        assert_eq!(resolver.resolve("date", None).as_deref(), Some("2024-03-05"));
        assert_eq!(resolver.resolve("time", None).as_deref(), Some("03:00"));
        assert_eq!(resolver.resolve("weekday", None).as_deref(), Some("Tuesday"));
    }

    #[test]
    fn named_zone_follows_daylight_saving() {
        let settings = Settings {
            timezone: "Europe/Paris".into(),
            ..Settings::default()
        };
        let winter = VariableContext::new(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
        let summer = VariableContext::new(Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap());
        let time = |ctx: &VariableContext| {
            VariableResolver::new(&settings, ctx).resolve("time", None)
        };
        assert_eq!(time(&winter).as_deref(), Some("13:00"));
        assert_eq!(time(&summer).as_deref(), Some("14:00"));
    }

    #[test]
    fn uuid_and_random_come_from_the_context() {
        let settings = utc_settings();
        let mut ctx = context();
        ctx.uuid = Uuid::from_u128(0x67e5_5044_10b1_426f_9247_bb68_0e5f_e0c8);
        ctx.random = 42;
        let resolver = VariableResolver::new(&settings, &ctx);
        assert_eq!(
            resolver.resolve("uuid", None).as_deref(),
            Some("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
        assert_eq!(resolver.resolve("random", None).as_deref(), Some("42"));
    }

    #[test]
    fn captured_context_draws_fresh_values() {
        let a = context();
        let b = context();
        assert_ne!(a.uuid, b.uuid);
        assert_eq!(a.uuid.get_version_num(), 4);
        for _ in 0..64 {
            assert!(context().random <= RANDOM_MAX);
        }
    }

    #[test]
    fn parses_locales() {
        assert_eq!(parse_locale("en-US"), Some(Locale::en_US));
        assert_eq!(parse_locale("vi_VN"), Some(Locale::vi_VN));
        assert_eq!(parse_locale("xx-YY"), None);
    }
}
