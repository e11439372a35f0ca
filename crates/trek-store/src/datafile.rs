//! The append-only participant log on disk.

use std::{
  ffi::OsString,
  fs::{self, File, OpenOptions},
  io::{self, Read, Seek, SeekFrom, Write},
  path::{Path, PathBuf},
};

use tracing::debug;
use trek_core::Person;

use crate::{
  Error, Result,
  encode::{HEADER, decode_person, encode_person, is_comment},
};

#[derive(Debug, Clone)]
pub struct DataFile {
  path: PathBuf,
}

impl DataFile {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }

  /// Every snapshot in file order, `None` if the file does not exist.
  pub fn read_all(&self) -> Result<Option<Vec<Person>>> {
    let text = match fs::read_to_string(&self.path) {
      Ok(text) => text,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(Error::file(&self.path)(e)),
    };

    let snapshots = text
      .lines()
      .enumerate()
      .filter(|(_, line)| !is_comment(line))
      .map(|(i, line)| decode_person(i + 1, line))
      .collect::<Result<Vec<_>>>()?;
    debug!(path = %self.path.display(), count = snapshots.len(), "data file read");
    Ok(Some(snapshots))
  }

  /// Append one delta record, creating the file if needed.
  pub fn append(&self, person: &Person) -> Result<()> {
    let mut file = OpenOptions::new()
      .read(true)
      .append(true)
      .create(true)
      .open(&self.path)
      .map_err(Error::file(&self.path))?;

    let mut record = String::new();
    if !ends_with_newline(&mut file).map_err(Error::file(&self.path))? {
      record.push('\n');
    }
    record.push_str(&encode_person(person));
    record.push('\n');
    file
      .write_all(record.as_bytes())
      .and_then(|()| file.sync_data())
      .map_err(Error::file(&self.path))
  }

  /// Replace the file with a header plus one record per snapshot.
  ///
  /// The new content is written next to the file first. Only then is a
  /// non-empty old file moved to a backup and the new one renamed into
  /// place, so a failed write leaves the old file untouched. Returns the
  /// backup path, if one was created.
  pub fn rewrite(&self, snapshots: &[Person]) -> Result<Option<PathBuf>> {
    let staging = self.sibling(".tmp");
    let mut content = String::with_capacity(HEADER.len() + 48 * snapshots.len());
    content.push_str(HEADER);
    content.push('\n');
    for snapshot in snapshots {
      content.push_str(&encode_person(snapshot));
      content.push('\n');
    }

    let written = File::create(&staging)
      .and_then(|mut file| file.write_all(content.as_bytes()).and_then(|()| file.sync_all()));
    if let Err(e) = written {
      let _ = fs::remove_file(&staging);
      return Err(Error::file(&staging)(e));
    }

    let backup = self.rotate_backup()?;
    fs::rename(&staging, &self.path).map_err(Error::file(&self.path))?;
    Ok(backup)
  }

  /// Move a non-empty file to `<file>.bakN`, N being the smallest free
  /// positive suffix. Missing and empty files are left alone.
  fn rotate_backup(&self) -> Result<Option<PathBuf>> {
    let len = match fs::metadata(&self.path) {
      Ok(meta) => meta.len(),
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(Error::file(&self.path)(e)),
    };
    if len == 0 {
      return Ok(None);
    }

    let backup = (1u32..)
      .map(|n| self.sibling(&format!(".bak{n}")))
      .find(|candidate| !candidate.exists())
      .ok_or_else(|| Error::file(&self.path)(io::ErrorKind::AlreadyExists.into()))?;
    fs::rename(&self.path, &backup).map_err(Error::file(&backup))?;
    Ok(Some(backup))
  }

  /// `<file><suffix>` in the same directory.
  fn sibling(&self, suffix: &str) -> PathBuf {
    let mut name = OsString::from(self.path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
  }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
  if file.metadata()?.len() == 0 {
    return Ok(true);
  }
  let mut last = [0u8; 1];
  file.seek(SeekFrom::End(-1))?;
  file.read_exact(&mut last)?;
  Ok(last[0] == b'\n')
}
