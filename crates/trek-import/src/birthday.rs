//! Birthday formats found in registration tables.

use std::sync::Arc;

use chrono::NaiveDate;

/// Turns the birthday cell of a registration row into a date.
pub type BirthdayParser = Arc<dyn Fn(&str) -> Option<NaiveDate> + Send + Sync>;

/// Two-digit years resolve into `PIVOT_YEAR ..= PIVOT_YEAR + 99`.
const PIVOT_YEAR: i32 = 1970;

/// How birthdays are written in the registration table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BirthdayFormat {
  /// `dd.MM.yy` or `dd.MM.yyyy`; two-digit years fall into 1970–2069.
  #[default]
  Registered,
  /// A chrono format string such as `%Y-%m-%d`.
  Pattern(String),
}

impl BirthdayFormat {
  pub fn parse(&self, text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    match self {
      Self::Registered => parse_registered(text),
      Self::Pattern(pattern) => NaiveDate::parse_from_str(text, pattern).ok(),
    }
  }

  pub fn into_parser(self) -> BirthdayParser { Arc::new(move |text: &str| self.parse(text)) }
}

fn parse_registered(text: &str) -> Option<NaiveDate> {
  let mut parts = text.split('.');
  let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
  if parts.next().is_some() {
    return None;
  }

  let day: u32 = digits(day, 1..=2)?.parse().ok()?;
  let month: u32 = digits(month, 1..=2)?.parse().ok()?;
  let year = digits(year, 2..=4)?;
  let year: i32 = match year.len() {
    2 => {
      let yy: i32 = year.parse().ok()?;
      let base = PIVOT_YEAR - PIVOT_YEAR % 100;
      if base + yy < PIVOT_YEAR { base + 100 + yy } else { base + yy }
    }
    _ => year.parse().ok()?,
  };
  NaiveDate::from_ymd_opt(year, month, day)
}

fn digits(s: &str, len: std::ops::RangeInclusive<usize>) -> Option<&str> {
  (len.contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())).then_some(s)
}
