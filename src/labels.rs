/// Class label module
///
/// The fixed, ordered alphabet of hand-sign classes. Index positions line up
/// one-to-one with the classifier's confidence vector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Rendered form of the "no stable letter" sentinel
pub const UNKNOWN_LETTER: &str = "??";

/// Name of the space class
pub const SPACE_LABEL: &str = "space";

/// Default alphabet: A-Z followed by space (index 26)
pub const DEFAULT_LABELS: [ClassLabel; 27] = [
    ClassLabel::Letter('A'),
    ClassLabel::Letter('B'),
    ClassLabel::Letter('C'),
    ClassLabel::Letter('D'),
    ClassLabel::Letter('E'),
    ClassLabel::Letter('F'),
    ClassLabel::Letter('G'),
    ClassLabel::Letter('H'),
    ClassLabel::Letter('I'),
    ClassLabel::Letter('J'),
    ClassLabel::Letter('K'),
    ClassLabel::Letter('L'),
    ClassLabel::Letter('M'),
    ClassLabel::Letter('N'),
    ClassLabel::Letter('O'),
    ClassLabel::Letter('P'),
    ClassLabel::Letter('Q'),
    ClassLabel::Letter('R'),
    ClassLabel::Letter('S'),
    ClassLabel::Letter('T'),
    ClassLabel::Letter('U'),
    ClassLabel::Letter('V'),
    ClassLabel::Letter('W'),
    ClassLabel::Letter('X'),
    ClassLabel::Letter('Y'),
    ClassLabel::Letter('Z'),
    ClassLabel::Space,
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LabelError {
    #[error("Unknown label name: {0:?}")]
    UnknownName(String),

    #[error("Label set must contain at least one label")]
    Empty,
}

/// A single hand-sign class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ClassLabel {
    /// A printable letter, committed as itself
    Letter(char),

    /// The space gesture, committed as `' '`
    Space,
}

impl ClassLabel {
    /// Character appended to the sentence when this label is committed
    pub fn to_char(self) -> char {
        match self {
            ClassLabel::Letter(c) => c,
            ClassLabel::Space => ' ',
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLabel::Letter(c) => write!(f, "{}", c),
            ClassLabel::Space => f.write_str(SPACE_LABEL),
        }
    }
}

impl FromStr for ClassLabel {
    type Err = LabelError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name == SPACE_LABEL {
            return Ok(ClassLabel::Space);
        }

        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_whitespace() && !c.is_control() => Ok(ClassLabel::Letter(c)),
            _ => Err(LabelError::UnknownName(name.to_string())),
        }
    }
}

impl TryFrom<String> for ClassLabel {
    type Error = LabelError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<ClassLabel> for String {
    fn from(label: ClassLabel) -> Self {
        label.to_string()
    }
}

/// Ordered label alphabet, indexed identically to the classifier output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ClassLabel>", into = "Vec<ClassLabel>")]
pub struct LabelSet {
    labels: Vec<ClassLabel>,
}

impl LabelSet {
    /// Create a label set; the order defines the classifier index mapping
    pub fn new(labels: Vec<ClassLabel>) -> Result<Self, LabelError> {
        if labels.is_empty() {
            return Err(LabelError::Empty);
        }
        Ok(Self { labels })
    }

    /// Parse a label set from names such as `["A", "B", "space"]`
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, LabelError> {
        let labels = names
            .iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(labels)
    }

    pub fn get(&self, index: usize) -> Option<ClassLabel> {
        self.labels.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS.to_vec(),
        }
    }
}

impl TryFrom<Vec<ClassLabel>> for LabelSet {
    type Error = LabelError;

    fn try_from(labels: Vec<ClassLabel>) -> Result<Self, Self::Error> {
        Self::new(labels)
    }
}

impl From<LabelSet> for Vec<ClassLabel> {
    fn from(set: LabelSet) -> Self {
        set.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_alphabet_layout() {
        let labels = LabelSet::default();
        assert_eq!(labels.len(), 27);
        assert_eq!(labels.get(0), Some(ClassLabel::Letter('A')));
        assert_eq!(labels.get(25), Some(ClassLabel::Letter('Z')));
        assert_eq!(labels.get(26), Some(ClassLabel::Space));
        assert_eq!(labels.get(27), None);
    }

    #[test]
    fn test_label_characters() {
        assert_eq!(ClassLabel::Letter('Q').to_char(), 'Q');
        assert_eq!(ClassLabel::Space.to_char(), ' ');
        assert_eq!(ClassLabel::Space.to_string(), "space");
        assert_eq!(ClassLabel::Letter('B').to_string(), "B");
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("space".parse::<ClassLabel>(), Ok(ClassLabel::Space));
        assert_eq!("K".parse::<ClassLabel>(), Ok(ClassLabel::Letter('K')));
        assert!("".parse::<ClassLabel>().is_err());
        assert!("AB".parse::<ClassLabel>().is_err());
        assert!(" ".parse::<ClassLabel>().is_err());
    }

    #[test]
    fn test_from_names() {
        let labels = LabelSet::from_names(&["A", "B", "space"]).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(2), Some(ClassLabel::Space));

        assert_eq!(
            LabelSet::from_names::<&str>(&[]),
            Err(LabelError::Empty)
        );
    }

    #[test]
    fn test_serde_by_name() {
        let labels = LabelSet::from_names(&["A", "space"]).unwrap();
        let json = serde_json::to_string(&labels).unwrap();
        assert_eq!(json, r#"["A","space"]"#);

        let back: LabelSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, labels);

        assert!(serde_json::from_str::<LabelSet>("[]").is_err());
    }
}
