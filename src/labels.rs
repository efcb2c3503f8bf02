//! Class label lookup.
//!
//! Label files hold one name per line with the line index as class id. The
//! pipeline only needs the [`LabelProvider`] trait; [`Labels`] is the plain
//! in-memory implementation.

use crate::util::{SightlineError, SightlineResult};
use std::io::BufRead;
use std::path::Path;

/// Maps class ids to human readable names.
pub trait LabelProvider {
    /// Returns the label for `class_id`, if known.
    fn label(&self, class_id: usize) -> Option<&str>;

    /// Returns the number of known classes.
    fn len(&self) -> usize;

    /// True when no labels are known.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the class id whose label equals `name`.
    fn class_id(&self, name: &str) -> Option<usize> {
        (0..self.len()).find(|&id| self.label(id) == Some(name))
    }
}

/// Owned list of class labels indexed by class id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    /// Creates labels from names in class-id order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses one label per line.
    ///
    /// Each line is trimmed; trailing blank lines are dropped while interior
    /// blank lines keep their slot so class ids stay aligned.
    pub fn from_text(text: &str) -> Self {
        let mut names: Vec<String> = text.lines().map(|l| l.trim().to_string()).collect();
        while names.last().is_some_and(|l| l.is_empty()) {
            names.pop();
        }
        Self { names }
    }

    /// Reads labels from a buffered reader.
    pub fn from_reader<R: BufRead>(mut reader: R) -> SightlineResult<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|err| SightlineError::LabelIo {
                reason: err.to_string(),
            })?;
        Ok(Self::from_text(&text))
    }

    /// Loads labels from a text file.
    pub fn load<P: AsRef<Path>>(path: P) -> SightlineResult<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|err| SightlineError::LabelIo {
            reason: format!("{}: {err}", path.as_ref().display()),
        })?;
        Ok(Self::from_text(&text))
    }

    /// Returns all names in class-id order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl LabelProvider for Labels {
    fn label(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.names.len()
    }
}

impl<T: LabelProvider + ?Sized> LabelProvider for &T {
    fn label(&self, class_id: usize) -> Option<&str> {
        (**self).label(class_id)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn class_id(&self, name: &str) -> Option<usize> {
        (**self).class_id(name)
    }
}

#[cfg(test)]
mod tests {
    use super::{LabelProvider, Labels};

    #[test]
    fn parses_lines_in_class_order() {
        let labels = Labels::from_text("person\n bicycle \ncar\n\n\n");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.label(1), Some("bicycle"));
        assert_eq!(labels.label(3), None);
        assert_eq!(labels.class_id("car"), Some(2));
        assert_eq!(labels.class_id("dog"), None);
    }

    #[test]
    fn interior_blank_lines_keep_their_slot() {
        let labels = Labels::from_text("a\n\nc\r\n");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.label(1), Some(""));
        assert_eq!(labels.label(2), Some("c"));
    }

    #[test]
    fn reader_matches_text() {
        let text = "cat\ndog\n";
        let from_reader = Labels::from_reader(text.as_bytes()).unwrap();
        assert_eq!(from_reader, Labels::from_text(text));
    }

    #[test]
    fn missing_file_is_label_io_error() {
        let err = Labels::load("/definitely/not/here/labels.txt").unwrap_err();
        assert!(matches!(err, crate::SightlineError::LabelIo { .. }));
    }
}
