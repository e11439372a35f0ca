//! Registration-table import for the trekking participant tracker.
//!
//! Reads an externally formatted, delimited table (as exported by the
//! registration form) and turns every row into a fresh [`Person`] carrying
//! only name, birthday and category. Start numbers and timestamps are
//! assigned later through updates.
//!
//! Pure and synchronous; the only I/O is reading the file in
//! [`TableImporter::read_file`].
//!
//! # Quick start
//!
//! ```no_run
//! use trek_core::Charset;
//! use trek_import::{BirthdayFormat, TableConfig, TableImporter};
//!
//! let importer = TableImporter::new(TableConfig::default(), BirthdayFormat::default())?;
//! let rows = importer.read_file("registrations.csv".as_ref(), Charset::Latin1)?;
//! for duplicate in trek_import::duplicates(&rows) {
//!   println!("registered twice: {duplicate}");
//! }
//! # Ok::<(), trek_import::Error>(())
//! ```

mod birthday;
pub mod error;
mod parse;

use std::{
  collections::{HashMap, HashSet},
  fmt, fs,
  path::Path,
};

pub use birthday::{BirthdayFormat, BirthdayParser};
pub use error::{Error, Result};
use serde::Deserialize;
use tracing::{debug, info};
use trek_core::{Charset, Person};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Where to find the interesting cells of a registration table.
///
/// Column indices are 1-based, matching how spreadsheet users count.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableConfig {
  pub separator:        String,
  pub skip_header_rows: usize,
  pub name_column:      usize,
  pub birthday_column:  usize,
  pub category_column:  usize,
}

impl Default for TableConfig {
  fn default() -> Self {
    Self {
      separator:        ",".into(),
      skip_header_rows: 0,
      name_column:      1,
      birthday_column:  2,
      category_column:  3,
    }
  }
}

impl TableConfig {
  /// Reject configurations no table could satisfy.
  pub fn validate(&self) -> Result<()> {
    if self.separator.is_empty() {
      return Err(Error::Config("separator must not be empty".into()));
    }
    let columns = [
      ("name", self.name_column),
      ("birthday", self.birthday_column),
      ("category", self.category_column),
    ];
    if let Some((field, _)) = columns.iter().find(|(_, column)| *column == 0) {
      return Err(Error::Config(format!("{field} column is 1-based, got 0")));
    }
    Ok(())
  }
}

// ─── Importer ────────────────────────────────────────────────────────────────

/// A validated table layout plus the birthday parser to apply to it.
#[derive(Clone)]
pub struct TableImporter {
  config:   TableConfig,
  birthday: BirthdayParser,
}

impl TableImporter {
  /// Fails if `config` does not pass [`TableConfig::validate`].
  pub fn new(config: TableConfig, birthday: BirthdayFormat) -> Result<Self> {
    Self::with_parser(config, birthday.into_parser())
  }

  /// Use an arbitrary birthday parser instead of one of the built-in formats.
  pub fn with_parser(config: TableConfig, birthday: BirthdayParser) -> Result<Self> {
    config.validate()?;
    Ok(Self { config, birthday })
  }

  /// Read and parse the table at `path`.
  ///
  /// The file is decoded as a whole; any malformed row fails the whole
  /// import.
  pub fn read_file(&self, path: &Path, charset: Charset) -> Result<Vec<Person>> {
    let bytes = fs::read(path)?;
    let text = charset.decode(&bytes)?;
    let rows = self.parse(&text)?;
    info!(path = %path.display(), %charset, rows = rows.len(), "registration table read");
    Ok(rows)
  }

  /// Parse already-decoded table text.
  pub fn parse(&self, text: &str) -> Result<Vec<Person>> {
    parse::parse_table(text, &self.config, &self.birthday)
  }
}

impl fmt::Debug for TableImporter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TableImporter")
      .field("config", &self.config)
      .finish_non_exhaustive()
  }
}

// ─── Duplicates ──────────────────────────────────────────────────────────────

/// Every identity that occurs more than once in `rows`, each listed once in
/// order of first appearance.
///
/// Rows are not removed; the caller decides how loudly to complain.
pub fn duplicates(rows: &[Person]) -> Vec<&Person> {
  let mut counts: HashMap<&Person, usize> = HashMap::with_capacity(rows.len());
  for row in rows {
    *counts.entry(row).or_default() += 1;
  }

  let mut seen = HashSet::new();
  let found: Vec<&Person> = rows
    .iter()
    .filter(|row| counts.get(row).is_some_and(|&n| n > 1))
    .filter(|row| seen.insert(*row))
    .collect();
  if !found.is_empty() {
    debug!(count = found.len(), "duplicate registrations");
  }
  found
}

/// The operator message for [`duplicates`], `None` if there are none.
pub fn duplicates_message(duplicates: &[&Person]) -> Option<String> {
  if duplicates.is_empty() {
    return None;
  }
  let plural = if duplicates.len() > 1 { "s" } else { "" };
  let names = duplicates
    .iter()
    .map(|p| p.to_string())
    .collect::<Vec<_>>()
    .join(", ");
  Some(format!("Duplicate person{plural}: {names}"))
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use chrono::NaiveDate;
  use trek_core::Category;

  use super::*;

  fn p(name: &str) -> Person {
    Person::new(name, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()).unwrap()
  }

  #[test]
  fn default_config_is_valid() {
    assert!(TableConfig::default().validate().is_ok());
  }

  #[test]
  fn zero_column_and_empty_separator_are_rejected() {
    let config = TableConfig { birthday_column: 0, ..TableConfig::default() };
    let err = TableImporter::new(config, BirthdayFormat::default()).unwrap_err();
    assert!(matches!(err, Error::Config(m) if m.contains("birthday")));

    let config = TableConfig { separator: String::new(), ..TableConfig::default() };
    assert!(matches!(config.validate(), Err(Error::Config(_))));
  }

  #[test]
  fn read_latin1_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registrations.csv");
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(b"Name;Born;Route\nJ\xFCrgen M\xFCller;03.04.1975;Rollstuhl\n").unwrap();
    drop(file);

    let config = TableConfig {
      separator: ";".into(),
      skip_header_rows: 1,
      ..TableConfig::default()
    };
    let importer = TableImporter::new(config, BirthdayFormat::default()).unwrap();
    let rows = importer.read_file(&path, Charset::Latin1).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name(), "Jürgen Müller");
    assert_eq!(rows[0].birthday(), NaiveDate::from_ymd_opt(1975, 4, 3).unwrap());
    assert_eq!(rows[0].category(), Some(Category::BarrierFree));
  }

  #[test]
  fn utf8_file_with_invalid_bytes_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registrations.csv");
    fs::write(&path, b"M\xFCller,01.01.90,Tour\n").unwrap();

    let importer = TableImporter::new(TableConfig::default(), BirthdayFormat::default()).unwrap();
    let err = importer.read_file(&path, Charset::Utf8).unwrap_err();
    assert!(matches!(err, Error::Core(trek_core::Error::Decoding { .. })));
  }

  #[test]
  fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let importer = TableImporter::new(TableConfig::default(), BirthdayFormat::default()).unwrap();
    let err = importer.read_file(&dir.path().join("absent.csv"), Charset::Utf8).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
  }

  #[test]
  fn custom_birthday_parser() {
    let importer = TableImporter::new(
      TableConfig::default(),
      BirthdayFormat::Pattern("%Y-%m-%d".into()),
    )
    .unwrap();
    let rows = importer.parse("Ann,1990-01-01,Doghike\n").unwrap();
    assert!(rows[0].deep_eq(&p("Ann").with_category(Some(Category::Doghike))));
  }

  #[test]
  fn duplicates_are_listed_once_in_order() {
    let rows = vec![p("Bob"), p("Ann"), p("Bob"), p("Carl"), p("Ann"), p("Bob")];
    let found = duplicates(&rows);
    let names: Vec<_> = found.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["Bob", "Ann"]);
    assert_eq!(
      duplicates_message(&found).as_deref(),
      Some("Duplicate persons: Bob, Ann")
    );

    let single = duplicates(&rows[..3]);
    assert_eq!(duplicates_message(&single).as_deref(), Some("Duplicate person: Bob"));
    assert!(duplicates_message(&duplicates(&[p("Ann")])).is_none());
  }
}
