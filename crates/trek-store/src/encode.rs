//! The line format of the participant data file.
//!
//! One snapshot per line, seven `;`-separated fields:
//!
//! ```text
//! # Name;Birthday;Category;Number;Start;Stop;Finisher
//! Anna Berg;1985-02-01;DOGTREKKING;17;2018-05-19T06:00:00Z;;false
//! ```
//!
//! Birthdays are ISO dates, instants are RFC 3339 in UTC. Optional fields are
//! left empty. Lines starting with `#` are comments.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use trek_core::{Category, Person};

use crate::{Error, Result};

pub const HEADER: &str = "# Name;Birthday;Category;Number;Start;Stop;Finisher";

const FIELDS: usize = 7;

// ─── Encode ──────────────────────────────────────────────────────────────────

pub fn encode_person(p: &Person) -> String {
  [
    p.name().to_owned(),
    p.birthday().to_string(),
    p.category().map(|c| c.to_string()).unwrap_or_default(),
    p.number().map(|n| n.to_string()).unwrap_or_default(),
    p.start().map(encode_instant).unwrap_or_default(),
    p.stop().map(encode_instant).unwrap_or_default(),
    p.finished_flag().to_string(),
  ]
  .join(";")
}

fn encode_instant(instant: DateTime<Utc>) -> String {
  instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ─── Decode ──────────────────────────────────────────────────────────────────

/// `true` for lines that carry no record.
pub fn is_comment(line: &str) -> bool { line.starts_with('#') || line.trim().is_empty() }

/// Decode one record; `line` is the 1-based line number used in errors.
pub fn decode_person(line: usize, record: &str) -> Result<Person> {
  let fail = |reason: String| Error::Parse { line, reason };

  let fields: Vec<&str> = record.splitn(FIELDS, ';').collect();
  let [name, birthday, category, number, start, stop, finished] = fields[..] else {
    return Err(fail(format!("expected {FIELDS} fields, found {}", fields.len())));
  };

  let birthday: NaiveDate = birthday
    .parse()
    .map_err(|e| fail(format!("birthday {birthday:?}: {e}")))?;
  let number = optional(number)
    .map(str::parse::<u32>)
    .transpose()
    .map_err(|e| fail(format!("start number {number:?}: {e}")))?;
  let start = optional(start)
    .map(decode_instant)
    .transpose()
    .map_err(|e| fail(format!("start {start:?}: {e}")))?;
  let stop = optional(stop)
    .map(decode_instant)
    .transpose()
    .map_err(|e| fail(format!("stop {stop:?}: {e}")))?;

  let person = Person::new(name, birthday).map_err(|e| fail(e.to_string()))?;
  Ok(
    person
      .with_category(optional(category).map(decode_category))
      .with_number(number)
      .with_start(start)
      .with_stop(stop)
      .with_finished(finished.trim().eq_ignore_ascii_case("true")),
  )
}

fn optional(field: &str) -> Option<&str> { Some(field.trim()).filter(|f| !f.is_empty()) }

/// The exact variant name, or keyword classification for hand-edited files.
fn decode_category(field: &str) -> Category {
  field.parse().unwrap_or_else(|_| Category::classify(field))
}

fn decode_instant(field: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
  DateTime::parse_from_rfc3339(field).map(|dt| dt.with_timezone(&Utc))
}
