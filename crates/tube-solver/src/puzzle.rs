//! Puzzle representation types for the layout exchange format.
//!
//! A layout is an ordered list of tubes, each an ordered list of color ids
//! from bottom to top with empty cells omitted. In JSON: `[[0,1],[1,0],[]]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::state::MAX_CAPACITY;

/// Color identifier of a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u8);

impl Color {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tubes listed bottom to top, empty cells omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout(pub Vec<Vec<Color>>);

impl Layout {
    /// Build a layout from raw color ids.
    pub fn from_ids<T: AsRef<[u8]>>(tubes: &[T]) -> Self {
        Self(
            tubes
                .iter()
                .map(|tube| tube.as_ref().iter().copied().map(Color).collect())
                .collect(),
        )
    }

    /// The solved layout of a class: one full tube per color, then the empty tubes.
    pub fn sorted(class: &PuzzleClass) -> Self {
        let mut tubes: Vec<Vec<Color>> = (0..class.colors)
            .map(|c| vec![Color(c as u8); class.capacity])
            .collect();
        tubes.extend((0..class.empty).map(|_| Vec::new()));
        Self(tubes)
    }

    pub fn tubes(&self) -> &[Vec<Color>] {
        &self.0
    }

    pub fn tube_count(&self) -> usize {
        self.0.len()
    }

    /// Length of the fullest tube
    pub fn longest_tube(&self) -> usize {
        self.0.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn unit_count(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, tube) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "[")?;
            for (j, color) in tube.iter().enumerate() {
                if j > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", color)?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}

/// A puzzle as read from disk: a layout plus the tube capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleConfig {
    /// Units per tube; inferred from the longest tube when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
    pub tubes: Layout,
}

impl PuzzleConfig {
    pub fn new(tubes: Layout, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            tubes,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.unwrap_or_else(|| self.tubes.longest_tube())
    }
}

/// A family of puzzles: color count, tube length and number of empty tubes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PuzzleClass {
    pub colors: usize,
    pub capacity: usize,
    pub empty: usize,
}

impl PuzzleClass {
    pub fn new(colors: usize, capacity: usize, empty: usize) -> Self {
        Self {
            colors,
            capacity,
            empty,
        }
    }

    pub fn tube_count(&self) -> usize {
        self.colors + self.empty
    }

    /// Reject classes whose color ids or capacity do not fit in a byte.
    ///
    /// Color id 255 marks empty cells, so at most 255 colors are usable.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.colors == 0
            || self.colors > MAX_CAPACITY
            || self.capacity == 0
            || self.capacity > MAX_CAPACITY
        {
            return Err(LayoutError::InvalidClass(self.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for PuzzleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.colors, self.capacity, self.empty)
    }
}

impl FromStr for PuzzleClass {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LayoutError::InvalidClass(s.to_string());
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(invalid());
        }
        let mut fields = [0usize; 3];
        for (field, part) in fields.iter_mut().zip(&parts) {
            *field = part.parse().map_err(|_| invalid())?;
        }
        let class = Self::new(fields[0], fields[1], fields[2]);
        class.validate().map_err(|_| invalid())?;
        Ok(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_json_format() {
        let layout = Layout::from_ids(&[vec![0u8, 1], vec![1, 0], vec![]]);
        let json = serde_json::to_string(&layout).unwrap();
        assert_eq!(json, "[[0,1],[1,0],[]]");

        let parsed: Layout = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, layout);
        assert_eq!(layout.to_string(), "[[0,1],[1,0],[]]");
    }

    #[test]
    fn test_config_capacity_inference() {
        let config: PuzzleConfig = serde_json::from_str(r#"{"tubes": [[0, 1, 1], [1], []]}"#).unwrap();
        assert_eq!(config.capacity, None);
        assert_eq!(config.capacity(), 3);

        let config: PuzzleConfig =
            serde_json::from_str(r#"{"capacity": 4, "tubes": [[0], [0]]}"#).unwrap();
        assert_eq!(config.capacity(), 4);
    }

    #[test]
    fn test_sorted_layout() {
        let layout = Layout::sorted(&PuzzleClass::new(3, 4, 2));
        assert_eq!(layout.tube_count(), 5);
        assert_eq!(layout.unit_count(), 12);
        assert_eq!(layout.tubes()[2], vec![Color(2); 4]);
        assert!(layout.tubes()[4].is_empty());
    }

    #[test]
    fn test_class_parse() {
        let class: PuzzleClass = "9:6:2".parse().unwrap();
        assert_eq!(class, PuzzleClass::new(9, 6, 2));
        assert_eq!(class.tube_count(), 11);
        assert_eq!(class.to_string(), "9:6:2");

        assert!("9:6".parse::<PuzzleClass>().is_err());
        assert!("0:6:2".parse::<PuzzleClass>().is_err());
        assert!("a:b:c".parse::<PuzzleClass>().is_err());
        assert!("256:4:2".parse::<PuzzleClass>().is_err());
        assert!("3:256:2".parse::<PuzzleClass>().is_err());
    }

    #[test]
    fn test_class_validate() {
        assert!(PuzzleClass::new(255, 4, 2).validate().is_ok());
        assert_eq!(
            PuzzleClass::new(300, 4, 2).validate(),
            Err(LayoutError::InvalidClass("300:4:2".to_string()))
        );
        assert!(PuzzleClass::new(3, 0, 2).validate().is_err());
    }
}
