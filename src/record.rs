use chrono::NaiveDate;
use compact_str::CompactString;
use serde::Serialize;

use crate::{Error, Result};

/// Format of the date inside `data-pre-plain-text`.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// One exported row. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Hour")]
    pub hour: CompactString,
    #[serde(rename = "User")]
    pub user: CompactString,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Emojis")]
    pub emojis: Option<String>,
    #[serde(rename = "Quoted_Message")]
    pub quoted_message: Option<String>,
}

impl MessageRecord {
    pub fn new(
        meta: &str,
        message: String,
        emojis: Option<String>,
        quoted_message: Option<String>,
    ) -> Result<Self> {
        let Meta { date, hour, user } = meta.parse()?;
        Ok(Self {
            date,
            hour,
            user,
            message,
            emojis,
            quoted_message,
        })
    }

    #[inline]
    #[must_use]
    pub fn sort_key(&self) -> (NaiveDate, &str) {
        (self.date, &self.hour)
    }
}

/// The sender prefix WhatsApp puts in front of every copyable message,
/// e.g. `[07:23, 10/18/2019] John:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub date: NaiveDate,
    pub hour: CompactString,
    pub user: CompactString,
}

impl core::str::FromStr for Meta {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let cleaned = raw
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | ','))
            .collect::<String>();
        let mut tokens = cleaned.split_whitespace();

        let (Some(hour), Some(date), Some(first)) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(Error::MalformedMeta(raw.to_owned()));
        };

        let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| Error::MalformedMeta(raw.to_owned()))?;

        // display names may contain spaces; only the final colon is markup
        let mut user = CompactString::from(first);
        for token in tokens {
            user.push(' ');
            user.push_str(token);
        }
        if user.ends_with(':') {
            user.pop();
        }

        Ok(Self {
            date,
            hour: hour.into(),
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sender_prefix() {
        let meta: Meta = "[07:23, 10/18/2019] John:".parse().unwrap();
        assert_eq!(meta.date, NaiveDate::from_ymd_opt(2019, 10, 18).unwrap());
        assert_eq!(meta.hour, "07:23");
        assert_eq!(meta.user, "John");
    }

    #[test]
    fn keeps_multi_word_names() {
        let meta: Meta = "[21:05, 1/2/2021] Mary Jane Watson: ".parse().unwrap();
        assert_eq!(meta.user, "Mary Jane Watson");
        assert_eq!(meta.date, NaiveDate::from_ymd_opt(2021, 1, 2).unwrap());
    }

    #[test]
    fn rejects_short_or_undated_prefixes() {
        assert!(matches!("[07:23] John:".parse::<Meta>(), Err(Error::MalformedMeta(_))));
        assert!(matches!("".parse::<Meta>(), Err(Error::MalformedMeta(_))));
        assert!(matches!(
            "[07:23, 18.10.2019] John:".parse::<Meta>(),
            Err(Error::MalformedMeta(_))
        ));
    }

    #[test]
    fn record_carries_optional_columns() {
        let record = MessageRecord::new(
            "[09:00, 03/04/2020] Ana:",
            "see you".to_owned(),
            Some(":wave:".to_owned()),
            None,
        )
        .unwrap();
        assert_eq!(record.user, "Ana");
        assert_eq!(record.emojis.as_deref(), Some(":wave:"));
        assert_eq!(record.sort_key().1, "09:00");
    }
}
