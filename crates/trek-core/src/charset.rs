//! Character sets accepted for external import files.

use std::{fmt, str::FromStr};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Charset {
  #[default]
  Utf8,
  /// ISO-8859-1; every byte maps to the code point of the same value.
  Latin1,
}

impl Charset {
  pub fn name(self) -> &'static str {
    match self {
      Self::Utf8 => "UTF-8",
      Self::Latin1 => "ISO-8859-1",
    }
  }

  /// Decode raw file content. A leading UTF-8 byte order mark is dropped.
  pub fn decode(self, bytes: &[u8]) -> Result<String> {
    match self {
      Self::Utf8 => {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::Decoding {
          charset: self.name(),
          reason:  e.to_string(),
        })
      }
      Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
    }
  }
}

impl fmt::Display for Charset {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Charset {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_uppercase().replace('_', "-").as_str() {
      "UTF-8" | "UTF8" => Ok(Self::Utf8),
      "ISO-8859-1" | "LATIN1" | "LATIN-1" => Ok(Self::Latin1),
      _ => Err(Error::UnknownCharset(s.to_owned())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_common_spellings() {
    assert_eq!("utf-8".parse::<Charset>().unwrap(), Charset::Utf8);
    assert_eq!("ISO_8859_1".parse::<Charset>().unwrap(), Charset::Latin1);
    assert!(matches!("ebcdic".parse::<Charset>(), Err(Error::UnknownCharset(_))));
  }

  #[test]
  fn latin1_maps_high_bytes() {
    let text = Charset::Latin1.decode(b"M\xFCller").unwrap();
    assert_eq!(text, "Müller");
  }

  #[test]
  fn utf8_strips_bom_and_rejects_garbage() {
    assert_eq!(Charset::Utf8.decode(b"\xEF\xBB\xBFAnn").unwrap(), "Ann");
    assert!(matches!(
      Charset::Utf8.decode(b"M\xFCller"),
      Err(Error::Decoding { charset: "UTF-8", .. })
    ));
  }
}
