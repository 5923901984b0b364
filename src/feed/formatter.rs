use chrono::{DateTime, SecondsFormat, TimeZone, Utc, Weekday};
use std::fmt::Display;

use crate::feed::FeedError;
use crate::model::{Category, Content, Image, Item, Link, Person};

/// Date representation used by a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `Mon, 15 Jan 2024 10:30:00 GMT` (RSS)
    Rfc1123,
    /// `2024-01-15T10:30:00Z` (Atom)
    Rfc3339,
}

impl DateFormat {
    pub fn format<Tz: TimeZone>(self, value: &DateTime<Tz>) -> String
    where
        Tz::Offset: Display,
    {
        match self {
            DateFormat::Rfc1123 => value
                .with_timezone(&Utc)
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string(),
            DateFormat::Rfc3339 => value.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// A scalar that can be written as element text or an attribute value.
///
/// Returns `None` for absent values so "no value" propagates instead of
/// becoming an empty string.
pub trait FeedValue {
    fn to_feed_value(&self, dates: DateFormat) -> Option<String>;
}

macro_rules! display_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FeedValue for $ty {
                fn to_feed_value(&self, _: DateFormat) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

display_value!(str, String, bool, u8, u16, u32, u64, usize, i32, i64, url::Url);

impl<Tz: TimeZone> FeedValue for DateTime<Tz>
where
    Tz::Offset: Display,
{
    fn to_feed_value(&self, dates: DateFormat) -> Option<String> {
        Some(dates.format(self))
    }
}

/// Full English day name, as used by RSS `<skipDays>`.
impl FeedValue for Weekday {
    fn to_feed_value(&self, _: DateFormat) -> Option<String> {
        let name = match self {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        };
        Some(name.to_string())
    }
}

impl<T: FeedValue> FeedValue for Option<T> {
    fn to_feed_value(&self, dates: DateFormat) -> Option<String> {
        self.as_ref().and_then(|v| v.to_feed_value(dates))
    }
}

impl<T: FeedValue + ?Sized> FeedValue for &T {
    fn to_feed_value(&self, dates: DateFormat) -> Option<String> {
        (**self).to_feed_value(dates)
    }
}

/// An encoder for one feed format.
///
/// `create_*` builds a validated content tree from a domain object without
/// emitting anything; `format` renders a tree to an XML fragment string.
/// Implementations own an output buffer, so one instance must not be shared
/// between concurrent feed generations.
pub trait Formatter {
    fn date_format(&self) -> DateFormat;

    fn format(&mut self, content: &Content) -> Result<String, FeedError>;

    fn create_link(&self, link: &Link) -> Result<Content, FeedError>;

    fn create_category(&self, category: &Category) -> Result<Content, FeedError>;

    fn create_person(&self, person: &Person) -> Result<Content, FeedError>;

    fn create_image(&self, image: &Image) -> Result<Content, FeedError>;

    fn create_item(&self, item: &Item) -> Result<Content, FeedError>;

    fn format_value<T: FeedValue + ?Sized>(&self, value: &T) -> Option<String> {
        value.to_feed_value(self.date_format())
    }

    fn format_link(&mut self, link: &Link) -> Result<String, FeedError> {
        let content = self.create_link(link)?;
        self.format(&content)
    }

    fn format_category(&mut self, category: &Category) -> Result<String, FeedError> {
        let content = self.create_category(category)?;
        self.format(&content)
    }

    fn format_person(&mut self, person: &Person) -> Result<String, FeedError> {
        let content = self.create_person(person)?;
        self.format(&content)
    }

    fn format_image(&mut self, image: &Image) -> Result<String, FeedError> {
        let content = self.create_image(image)?;
        self.format(&content)
    }

    fn format_item(&mut self, item: &Item) -> Result<String, FeedError> {
        let content = self.create_item(item)?;
        self.format(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_rfc1123_and_rfc3339() {
        let ts = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(
            DateFormat::Rfc1123.format(&ts),
            "Mon, 15 Jan 2024 10:30:00 GMT"
        );
        assert_eq!(DateFormat::Rfc3339.format(&ts), "2024-01-15T10:30:00Z");
    }

    #[test]
    fn test_offsets() {
        let ts = DateTime::parse_from_rfc3339("2024-01-15T12:30:00+02:00").unwrap();
        // RSS normalizes to GMT
        assert_eq!(
            DateFormat::Rfc1123.format(&ts),
            "Mon, 15 Jan 2024 10:30:00 GMT"
        );
        // Atom keeps the offset
        assert_eq!(
            DateFormat::Rfc3339.format(&ts),
            "2024-01-15T12:30:00+02:00"
        );
    }

    #[test]
    fn test_scalars_and_absent_values() {
        assert_eq!(
            42u64.to_feed_value(DateFormat::Rfc1123).as_deref(),
            Some("42")
        );
        assert_eq!(
            "text".to_feed_value(DateFormat::Rfc3339).as_deref(),
            Some("text")
        );
        assert_eq!(
            Weekday::Sat.to_feed_value(DateFormat::Rfc1123).as_deref(),
            Some("Saturday")
        );
        let absent: Option<DateTime<FixedOffset>> = None;
        assert_eq!(absent.to_feed_value(DateFormat::Rfc3339), None);
    }
}
