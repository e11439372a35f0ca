//! Runtime settings, read from `trekking.toml` and `TREKKING_*` variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use trek_import::{BirthdayFormat, TableConfig};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// The participant log owned by the store.
  pub data_file:       PathBuf,
  /// chrono format of registration birthdays; unset means `dd.MM.yy(yy)`.
  pub birthday_format: Option<String>,
  /// Layout of the registration table.
  pub table:           TableConfig,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      data_file:       PathBuf::from("participant_data.dat"),
      birthday_format: None,
      table:           TableConfig::default(),
    }
  }
}

impl Settings {
  /// Layer `TREKKING_*` environment variables over the optional file at
  /// `path`. Nested keys use `__`, e.g. `TREKKING_TABLE__SEPARATOR`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("TREKKING")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn birthday_format(&self) -> BirthdayFormat {
    self
      .birthday_format
      .clone()
      .map_or(BirthdayFormat::Registered, BirthdayFormat::Pattern)
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.data_file, PathBuf::from("participant_data.dat"));
    assert_eq!(settings.table, TableConfig::default());
    assert_eq!(settings.birthday_format(), BirthdayFormat::Registered);
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trekking.toml");
    fs::write(
      &path,
      r#"
data_file = "event.dat"
birthday_format = "%d/%m/%Y"

[table]
separator = ";"
skip_header_rows = 2
category_column = 8
"#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.data_file, PathBuf::from("event.dat"));
    assert_eq!(
      settings.birthday_format(),
      BirthdayFormat::Pattern("%d/%m/%Y".into())
    );
    assert_eq!(settings.table.separator, ";");
    assert_eq!(settings.table.skip_header_rows, 2);
    assert_eq!(settings.table.name_column, 1);
    assert_eq!(settings.table.category_column, 8);
  }
}
