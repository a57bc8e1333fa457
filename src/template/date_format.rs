// Unicode date patterns (`yyyy-MM-dd 'at' HH:mm`) compiled onto chrono format items

use std::fmt::{self, Write};

use chrono::format::{Fixed, Item, Numeric, Pad};
use chrono::{DateTime, TimeZone};

use crate::error::{Result, TemplateSyntaxError};

/// A compiled date pattern used by the `now` tag.
///
/// Supported fields: `y`, `yy`, `yyyy`, `M` through `MMMM`, `d`, `dd`, `E` through
/// `EEEE`, `H`, `HH`, `h`, `hh`, `m`, `mm`, `s`, `ss`, `a`, `Z` and `ZZZZZ`.
/// Text inside single quotes is literal and `''` is a single quote. Any other
/// run of letters is copied through unchanged.
#[derive(Clone)]
pub struct DateFormatter {
    pattern: String,
    items: Vec<Item<'static>>,
}

impl DateFormatter {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let items = compile(&pattern);
        Self { pattern, items }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn format<Tz>(&self, date: &DateTime<Tz>) -> Result<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut output = String::new();
        write!(output, "{}", date.format_with_items(self.items.iter())).map_err(|_| {
            TemplateSyntaxError::new(format!(
                "Failed to format date with pattern '{}'",
                self.pattern
            ))
        })?;
        Ok(output)
    }
}

impl fmt::Debug for DateFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DateFormatter").field(&self.pattern).finish()
    }
}

fn compile(pattern: &str) -> Vec<Item<'static>> {
    let mut items = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                literal.push('\'');
                continue;
            }
            // quoted section; `''` inside it is an escaped quote
            while let Some(quoted) = chars.next() {
                if quoted == '\'' {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        literal.push('\'');
                    } else {
                        break;
                    }
                } else {
                    literal.push(quoted);
                }
            }
            continue;
        }

        if !ch.is_ascii_alphabetic() {
            literal.push(ch);
            continue;
        }

        let mut count = 1;
        while chars.peek() == Some(&ch) {
            chars.next();
            count += 1;
        }

        match field(ch, count) {
            Some(item) => {
                flush(&mut literal, &mut items);
                items.push(item);
            }
            None => literal.extend(std::iter::repeat(ch).take(count)),
        }
    }

    flush(&mut literal, &mut items);
    items
}

fn flush(literal: &mut String, items: &mut Vec<Item<'static>>) {
    if !literal.is_empty() {
        items.push(Item::OwnedLiteral(std::mem::take(literal).into_boxed_str()));
    }
}

fn field(letter: char, count: usize) -> Option<Item<'static>> {
    let numeric = |numeric: Numeric| {
        let pad = if count >= 2 { Pad::Zero } else { Pad::None };
        Item::Numeric(numeric, pad)
    };

    let item = match (letter, count) {
        ('y', 2) => Item::Numeric(Numeric::YearMod100, Pad::Zero),
        ('y', _) => numeric(Numeric::Year),
        ('M', 1 | 2) => numeric(Numeric::Month),
        ('M', 3) => Item::Fixed(Fixed::ShortMonthName),
        ('M', _) => Item::Fixed(Fixed::LongMonthName),
        ('d', 1 | 2) => numeric(Numeric::Day),
        ('E', 1..=3) => Item::Fixed(Fixed::ShortWeekdayName),
        ('E', _) => Item::Fixed(Fixed::LongWeekdayName),
        ('H', 1 | 2) => numeric(Numeric::Hour),
        ('h', 1 | 2) => numeric(Numeric::Hour12),
        ('m', 1 | 2) => numeric(Numeric::Minute),
        ('s', 1 | 2) => numeric(Numeric::Second),
        ('a', _) => Item::Fixed(Fixed::UpperAmPm),
        ('Z', 1..=4) => Item::Fixed(Fixed::TimezoneOffset),
        ('Z', 5) => Item::Fixed(Fixed::TimezoneOffsetColon),
        _ => return None,
    };
    Some(item)
}
