//! Row-by-row parsing of a delimited registration table.
//!
//! Pipeline:
//!   decoded text
//!     └─ data_lines()   → (line number, &str), comments and blanks dropped
//!          └─ skip header rows
//!               └─ parse_row() → Person with name, birthday, category

use trek_core::{Category, Person};

use crate::{
  BirthdayParser, TableConfig,
  error::{Error, Result},
};

/// Non-comment, non-blank lines with their 1-based line numbers.
pub(crate) fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
  text
    .lines()
    .enumerate()
    .map(|(i, line)| (i + 1, line))
    .filter(|(_, line)| !line.starts_with('#') && !line.trim().is_empty())
}

pub(crate) fn parse_table(
  text: &str,
  config: &TableConfig,
  birthday: &BirthdayParser,
) -> Result<Vec<Person>> {
  data_lines(text)
    .skip(config.skip_header_rows)
    .map(|(line, row)| parse_row(line, row, config, birthday))
    .collect()
}

fn parse_row(
  line: usize,
  row: &str,
  config: &TableConfig,
  birthday: &BirthdayParser,
) -> Result<Person> {
  let fields: Vec<&str> = row.split(config.separator.as_str()).collect();
  let column = |column: usize| {
    fields
      .get(column - 1)
      .copied()
      .ok_or(Error::MissingColumn { line, column })
  };

  let name = column(config.name_column)?.trim();
  let birthday_text = column(config.birthday_column)?.trim();
  let category = Category::classify(column(config.category_column)?);

  let born = birthday(birthday_text).ok_or_else(|| Error::Birthday {
    line,
    value: birthday_text.to_owned(),
  })?;

  let person = Person::new(name, born).map_err(|_| Error::InvalidName {
    line,
    name: name.to_owned(),
  })?;
  Ok(person.with_category(Some(category)))
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::BirthdayFormat;

  fn config() -> TableConfig {
    TableConfig {
      separator:        ",".into(),
      skip_header_rows: 1,
      name_column:      1,
      birthday_column:  4,
      category_column:  8,
    }
  }

  #[test]
  fn comment_and_blank_lines_are_skipped() {
    let text = "#header\n1;2;3\n#3;4;5\n\n5;6;7\n";
    let lines: Vec<_> = data_lines(text).collect();
    assert_eq!(lines, vec![(2, "1;2;3"), (5, "5;6;7")]);
  }

  #[test]
  fn parses_configured_columns() {
    let text = "Name,Street,Town,Born,Mail,Phone,Dog,Route\r\n\
                Anna Berg ,Main St,Town, 01.02.85,a@b.c,123,Rex,Dogtrekking 50km\r\n\
                Carl Dorn,Side St,Town,24.12.1961,c@d.e,456,Bello,Tour 10km\r\n";
    let parser = BirthdayFormat::Registered.into_parser();
    let rows = parse_table(text, &config(), &parser).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name(), "Anna Berg");
    assert_eq!(rows[0].birthday(), NaiveDate::from_ymd_opt(1985, 2, 1).unwrap());
    assert_eq!(rows[0].category(), Some(Category::Dogtrekking));
    assert_eq!(rows[0].number(), None);
    assert_eq!(rows[1].category(), Some(Category::Tour));
  }

  #[test]
  fn missing_column_fails_whole_table() {
    let text = "header\nAnna,x,y,01.02.85,m,p,d,Tour\nShort,row\n";
    let parser = BirthdayFormat::Registered.into_parser();
    let err = parse_table(text, &config(), &parser).unwrap_err();
    assert!(matches!(err, Error::MissingColumn { line: 3, column: 4 }));
  }

  #[test]
  fn bad_birthday_reports_line_and_value() {
    let text = "header\nAnna,x,y,someday,m,p,d,Tour\n";
    let parser = BirthdayFormat::Registered.into_parser();
    let err = parse_table(text, &config(), &parser).unwrap_err();
    assert!(matches!(err, Error::Birthday { line: 2, ref value } if value == "someday"));
  }

  #[test]
  fn invalid_name_is_rejected() {
    let config = TableConfig { separator: ",".into(), skip_header_rows: 0, ..config() };
    let text = "An;na,x,y,01.02.85,m,p,d,Tour\n";
    let parser = BirthdayFormat::Registered.into_parser();
    let err = parse_table(text, &config, &parser).unwrap_err();
    assert!(matches!(err, Error::InvalidName { line: 1, .. }));
  }
}
