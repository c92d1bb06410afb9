//! DisplayStatus - named status entries shown next to the display.

use std::collections::BTreeMap;
use std::fmt;

/// Severity of one status entry. Ordered from best to worst.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusLevel {
  Ok,
  Warn,
  Error,
}

impl fmt::Display for StatusLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      StatusLevel::Ok => "Ok",
      StatusLevel::Warn => "Warn",
      StatusLevel::Error => "Error",
    })
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusEntry {
  pub level: StatusLevel,
  pub message: String,
}

/// Status entries keyed by name ("Topic", "Messages", ...).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayStatus {
  entries: BTreeMap<String, StatusEntry>,
}

impl DisplayStatus {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&mut self, name: &str, level: StatusLevel, message: impl Into<String>) {
    self.entries.insert(
      name.to_string(),
      StatusEntry {
        level,
        message: message.into(),
      },
    );
  }

  pub fn ok(&mut self, name: &str, message: impl Into<String>) {
    self.set(name, StatusLevel::Ok, message);
  }

  pub fn warn(&mut self, name: &str, message: impl Into<String>) {
    self.set(name, StatusLevel::Warn, message);
  }

  pub fn error(&mut self, name: &str, message: impl Into<String>) {
    self.set(name, StatusLevel::Error, message);
  }

  pub fn remove(&mut self, name: &str) {
    self.entries.remove(name);
  }

  pub fn get(&self, name: &str) -> Option<&StatusEntry> {
    self.entries.get(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &StatusEntry)> {
    self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
  }

  /// Worst level across entries (Ok when empty).
  pub fn level(&self) -> StatusLevel {
    self
      .entries
      .values()
      .map(|e| e.level)
      .max()
      .unwrap_or(StatusLevel::Ok)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_overall_level_is_worst_entry() {
    let mut status = DisplayStatus::new();
    assert_eq!(status.level(), StatusLevel::Ok);

    status.ok("Topic", "subscribed");
    status.warn("Decode", "truncated");
    assert_eq!(status.level(), StatusLevel::Warn);

    status.error("Topic", "empty topic");
    assert_eq!(status.level(), StatusLevel::Error);
    assert_eq!(status.get("Topic").map(|e| e.level), Some(StatusLevel::Error));

    status.remove("Topic");
    assert_eq!(status.level(), StatusLevel::Warn);
  }

  #[test]
  fn test_entries_iterate_by_name() {
    let mut status = DisplayStatus::new();
    status.ok("Topic", "a");
    status.ok("Messages", "b");
    let names: Vec<&str> = status.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Messages", "Topic"]);
  }
}
