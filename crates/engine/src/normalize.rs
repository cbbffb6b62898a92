//! Parsers for the free-text fields of the source documents.
//!
//! Two grammars live here:
//!
//! - opening hours, e.g. `Mon - Fri 08:00 - 17:00 / Sat, Sun 08:00 - 12:00`
//! - mask descriptors, e.g. `Second Smile (black) (10 per pack)`
//!
//! Both are pure: no I/O, no state.

use std::{fmt, str::FromStr};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine};

/// Day of the week, in the canonical `Mon..Sun` order used to expand ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
        Self::Sun,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mon => "Mon",
            Self::Tue => "Tue",
            Self::Wed => "Wed",
            Self::Thu => "Thu",
            Self::Fri => "Fri",
            Self::Sat => "Sat",
            Self::Sun => "Sun",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|day| day.as_str() == s)
            .ok_or_else(|| EngineError::Parse(format!("unknown day token: \"{s}\"")))
    }
}

/// One weekly interval of a pharmacy schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpeningHours {
    pub day: Weekday,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
}

/// `HH:MM`, the storage format for times of day.
pub const TIME_FORMAT: &str = "%H:%M";

/// Length of `HH:MM - HH:MM`.
const TIME_RANGE_LEN: usize = 13;

/// Parses an opening-hours expression into one row per day.
///
/// Segments are separated by `/`; each one is `<day-list> HH:MM - HH:MM`.
/// A day list mixes single days and inclusive `<Day> - <Day>` ranges.
/// Duplicate rows are passed through.
pub fn parse_opening_hours(expr: &str) -> ResultEngine<Vec<OpeningHours>> {
    let mut rows = Vec::new();
    for segment in expr.split('/').map(str::trim) {
        if segment.is_empty() {
            continue;
        }
        let (days_part, open_time, close_time) = split_segment(segment)?;
        for day in parse_day_list(days_part)? {
            rows.push(OpeningHours {
                day,
                open_time,
                close_time,
            });
        }
    }
    if rows.is_empty() {
        return Err(EngineError::Parse(format!(
            "no opening hours in \"{expr}\""
        )));
    }
    Ok(rows)
}

/// Splits `<prefix> HH:MM - HH:MM` at the first place the time range matches.
fn split_segment(segment: &str) -> ResultEngine<(&str, NaiveTime, NaiveTime)> {
    let malformed = || EngineError::Parse(format!("malformed opening hours: \"{segment}\""));

    let start = segment
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| is_time_range(&segment.as_bytes()[i..]))
        .ok_or_else(malformed)?;
    let range = &segment[start..start + TIME_RANGE_LEN];
    if !segment[start + TIME_RANGE_LEN..].trim().is_empty() {
        return Err(malformed());
    }

    let open_time = parse_time(&range[..5])?;
    let close_time = parse_time(&range[8..])?;
    if open_time >= close_time {
        return Err(EngineError::Parse(format!(
            "opening time must precede closing time: \"{segment}\""
        )));
    }
    Ok((segment[..start].trim(), open_time, close_time))
}

/// `DD:DD - DD:DD` at the start of `bytes`.
fn is_time_range(bytes: &[u8]) -> bool {
    const SHAPE: &[u8; TIME_RANGE_LEN] = b"00:00 - 00:00";
    bytes.len() >= TIME_RANGE_LEN
        && SHAPE.iter().zip(bytes).all(|(shape, byte)| match shape {
            b'0' => byte.is_ascii_digit(),
            other => other == byte,
        })
}

fn parse_time(value: &str) -> ResultEngine<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| EngineError::Parse(format!("invalid time of day: \"{value}\"")))
}

fn parse_day_list(days_part: &str) -> ResultEngine<Vec<Weekday>> {
    let mut days = Vec::new();
    for part in days_part.split(',').map(str::trim) {
        match part.split_once('-') {
            Some((from, to)) => {
                let from: Weekday = from.trim().parse()?;
                let to: Weekday = to.trim().parse()?;
                if from > to {
                    return Err(EngineError::Parse(format!(
                        "day range runs backwards: \"{part}\""
                    )));
                }
                days.extend_from_slice(&Weekday::ALL[from.index()..=to.index()]);
            }
            None => days.push(part.parse()?),
        }
    }
    Ok(days)
}

/// A mask catalog line decoded from its descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskDescriptor {
    pub mask_name: String,
    pub color: String,
    pub pack_quantity: i32,
    /// Catalog lines carry a price, purchase-history references do not.
    pub price: Option<MoneyCents>,
}

/// Parses `<name> (<color>) (<N> per pack)`.
///
/// The price is not part of the text: catalog lines pass it alongside,
/// purchase-history references pass `None`.
pub fn parse_mask_descriptor(
    text: &str,
    price: Option<MoneyCents>,
) -> ResultEngine<MaskDescriptor> {
    let malformed = || EngineError::Parse(format!("malformed mask descriptor: \"{text}\""));

    let rest = text.trim().strip_suffix(')').ok_or_else(malformed)?;
    let pack_open = rest.rfind('(').ok_or_else(malformed)?;
    let quantity = rest[pack_open + 1..]
        .strip_suffix(" per pack")
        .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(malformed)?;
    let pack_quantity: i32 = quantity.parse().map_err(|_| malformed())?;
    if pack_quantity == 0 {
        return Err(EngineError::Parse(format!(
            "pack quantity must be positive: \"{text}\""
        )));
    }

    // Non-greedy name: the color spans from the first '(' up to the ')'
    // that precedes the pack group.
    let head = rest[..pack_open].trim_end();
    let head = head.strip_suffix(')').ok_or_else(malformed)?;
    let color_open = head.find('(').ok_or_else(malformed)?;
    // The name may be empty: "(black) (10 per pack)" is a nameless mask.
    let mask_name = head[..color_open].trim();

    Ok(MaskDescriptor {
        mask_name: mask_name.to_string(),
        color: head[color_open + 1..].trim().to_string(),
        pack_quantity,
        price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(value: &str) -> NaiveTime {
        NaiveTime::parse_from_str(value, TIME_FORMAT).unwrap()
    }

    #[test]
    fn expands_ranges_and_lists() {
        let rows =
            parse_opening_hours("Mon - Fri 08:00 - 17:00 / Sat, Sun 08:00 - 12:00").unwrap();

        assert_eq!(rows.len(), 7);
        let weekdays: Vec<_> = rows[..5].iter().map(|r| r.day).collect();
        assert_eq!(weekdays, Weekday::ALL[..5].to_vec());
        assert!(rows[..5]
            .iter()
            .all(|r| r.open_time == time("08:00") && r.close_time == time("17:00")));
        assert_eq!(rows[5].day, Weekday::Sat);
        assert_eq!(rows[6].day, Weekday::Sun);
        assert!(rows[5..]
            .iter()
            .all(|r| r.open_time == time("08:00") && r.close_time == time("12:00")));
    }

    #[test]
    fn row_count_is_sum_of_expanded_days() {
        let rows = parse_opening_hours(
            "Mon, Wed, Fri 08:00 - 12:00 / Tue - Thu 14:00 - 18:00 / Sun 10:00 - 11:30",
        )
        .unwrap();

        assert_eq!(rows.len(), 3 + 3 + 1);
        assert!(rows.iter().all(|r| r.open_time < r.close_time));
    }

    #[test]
    fn duplicates_are_kept() {
        let rows = parse_opening_hours("Mon 08:00 - 12:00 / Mon 08:00 - 12:00").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], rows[1]);
    }

    #[test]
    fn compact_range_and_trailing_slash() {
        let rows = parse_opening_hours("Sat-Sun 09:00 - 13:00 /").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn rejects_unknown_day_token() {
        let err = parse_opening_hours("Mon, Thur 08:00 - 12:00").unwrap_err();
        assert_eq!(err, EngineError::Parse("unknown day token: \"Thur\"".to_string()));
    }

    #[test]
    fn rejects_malformed_segments() {
        assert!(matches!(
            parse_opening_hours("Mon 8:00 - 12:00"),
            Err(EngineError::Parse(_))
        ));
        assert!(matches!(
            parse_opening_hours("Mon 08:00-12:00"),
            Err(EngineError::Parse(_))
        ));
        assert!(matches!(
            parse_opening_hours("Mon 08:00 - 12:00 closed"),
            Err(EngineError::Parse(_))
        ));
        assert!(matches!(parse_opening_hours(""), Err(EngineError::Parse(_))));
    }

    #[test]
    fn rejects_impossible_or_inverted_times() {
        assert!(matches!(
            parse_opening_hours("Mon 25:00 - 26:00"),
            Err(EngineError::Parse(_))
        ));
        assert!(matches!(
            parse_opening_hours("Mon - Wed 20:00 - 02:00"),
            Err(EngineError::Parse(_))
        ));
        assert!(matches!(
            parse_opening_hours("Sun - Mon 08:00 - 12:00"),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn parses_priced_mask_descriptor() {
        let mask =
            parse_mask_descriptor("Second Smile (black) (10 per pack)", Some(MoneyCents::new(1599)))
                .unwrap();

        assert_eq!(
            mask,
            MaskDescriptor {
                mask_name: "Second Smile".to_string(),
                color: "black".to_string(),
                pack_quantity: 10,
                price: Some(MoneyCents::new(1599)),
            }
        );
    }

    #[test]
    fn parses_bare_mask_reference() {
        let mask = parse_mask_descriptor("MaskT (green) (6 per pack)", None).unwrap();
        assert_eq!(mask.mask_name, "MaskT");
        assert_eq!(mask.color, "green");
        assert_eq!(mask.pack_quantity, 6);
        assert_eq!(mask.price, None);
    }

    #[test]
    fn color_spans_to_pack_group() {
        let mask = parse_mask_descriptor("Cotton Kiss (blue) (grey) (3 per pack)", None).unwrap();
        assert_eq!(mask.mask_name, "Cotton Kiss");
        assert_eq!(mask.color, "blue) (grey");
    }

    #[test]
    fn accepts_nameless_mask() {
        let mask = parse_mask_descriptor("(black) (10 per pack)", None).unwrap();
        assert_eq!(mask.mask_name, "");
        assert_eq!(mask.color, "black");
        assert_eq!(mask.pack_quantity, 10);
    }

    #[test]
    fn rejects_malformed_mask_descriptors() {
        for text in [
            "bad format",
            "Second Smile (black)",
            "Second Smile (black) (ten per pack)",
            "Second Smile (black) (10 per box)",
            "Second Smile (black) (0 per pack)",
        ] {
            assert!(
                matches!(parse_mask_descriptor(text, None), Err(EngineError::Parse(_))),
                "{text} should be rejected"
            );
        }
    }
}
