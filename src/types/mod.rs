mod declaration_counter;

pub use declaration_counter::DeclarationCounter;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclarationId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// A zero-based line/column location in a source file.
///
/// Columns are byte offsets into the line, matching what the tree-sitter
/// parser reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    Namespace,
    Method,
    Constant,
    ClassVariable,
    InstanceVariable,
    GlobalVariable,
    Alias,
}

impl DeclarationId {
    pub fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl FileId {
    pub fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Position {
    pub fn new(line: u32, column: u16) -> Self {
        Self { line, column }
    }
}

/// Columns past `u16::MAX` clamp to it instead of wrapping around.
fn saturating_column(column: usize) -> u16 {
    u16::try_from(column).unwrap_or(u16::MAX)
}

impl From<tree_sitter::Point> for Position {
    fn from(point: tree_sitter::Point) -> Self {
        Self {
            line: point.row as u32,
            column: saturating_column(point.column),
        }
    }
}

impl Range {
    pub fn new(start_line: u32, start_column: u16, end_line: u32, end_column: u16) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    pub fn from_node(node: &tree_sitter::Node) -> Self {
        let start = Position::from(node.start_position());
        let end = Position::from(node.end_position());
        Self::new(start.line, start.column, end.line, end.column)
    }

    pub fn start(&self) -> Position {
        Position::new(self.start_line, self.start_column)
    }

    pub fn end(&self) -> Position {
        Position::new(self.end_line, self.end_column)
    }

    /// Inclusive on both ends, so a cursor sitting right after a name still hits it.
    pub fn contains(&self, line: u32, column: u16) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }

        if line == self.start_line && column < self.start_column {
            return false;
        }

        if line == self.end_line && column > self.end_column {
            return false;
        }

        true
    }

    pub fn contains_position(&self, position: Position) -> bool {
        self.contains(position.line, position.column)
    }

    /// True when `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &Range) -> bool {
        self.contains_position(other.start()) && self.contains_position(other.end())
    }

    /// True when `self` sits inside `other` and is not the same span.
    pub fn is_narrower_than(&self, other: &Range) -> bool {
        self != other && other.encloses(self)
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeclarationKind::Namespace => "Namespace",
            DeclarationKind::Method => "Method",
            DeclarationKind::Constant => "Constant",
            DeclarationKind::ClassVariable => "ClassVariable",
            DeclarationKind::InstanceVariable => "InstanceVariable",
            DeclarationKind::GlobalVariable => "GlobalVariable",
            DeclarationKind::Alias => "Alias",
        };
        f.write_str(label)
    }
}

impl FromStr for DeclarationKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Namespace" => Ok(DeclarationKind::Namespace),
            "Method" => Ok(DeclarationKind::Method),
            "Constant" => Ok(DeclarationKind::Constant),
            "ClassVariable" => Ok(DeclarationKind::ClassVariable),
            "InstanceVariable" => Ok(DeclarationKind::InstanceVariable),
            "GlobalVariable" => Ok(DeclarationKind::GlobalVariable),
            "Alias" => Ok(DeclarationKind::Alias),
            _ => Err("Unknown declaration kind"),
        }
    }
}

impl DeclarationKind {
    /// Kinds that live in the constant namespace of their owner
    pub fn is_constant_like(&self) -> bool {
        matches!(self, DeclarationKind::Namespace | DeclarationKind::Constant)
    }
}

pub type CompactString = Box<str>;

pub fn compact_string(s: &str) -> CompactString {
    s.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_id_creation() {
        assert!(DeclarationId::new(0).is_none());

        let id = DeclarationId::new(42).unwrap();
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn test_file_id_creation() {
        assert!(FileId::new(0).is_none());

        let id = FileId::new(100).unwrap();
        assert_eq!(id.value(), 100);
    }

    #[test]
    fn test_range_contains() {
        let range = Range::new(10, 5, 15, 20);

        assert!(range.contains(12, 10));
        assert!(range.contains(10, 5));
        assert!(range.contains(15, 20));

        assert!(!range.contains(9, 10));
        assert!(!range.contains(16, 10));
        assert!(!range.contains(10, 4));
        assert!(!range.contains(15, 21));
    }

    #[test]
    fn test_long_line_columns_saturate() {
        let near = Position::from(tree_sitter::Point::new(3, 65_000));
        assert_eq!(near, Position::new(3, 65_000));

        let far = Position::from(tree_sitter::Point::new(3, 70_000));
        assert_eq!(far, Position::new(3, u16::MAX));
        assert!(far > near);
    }

    #[test]
    fn test_range_narrowness() {
        let outer = Range::new(7, 0, 7, 13);
        let inner = Range::new(7, 0, 7, 8);
        let innermost = Range::new(7, 0, 7, 3);

        assert!(inner.is_narrower_than(&outer));
        assert!(innermost.is_narrower_than(&inner));
        assert!(!outer.is_narrower_than(&inner));
        assert!(!outer.is_narrower_than(&outer));
    }

    #[test]
    fn test_declaration_kind_round_trips_through_display() {
        for kind in [
            DeclarationKind::Namespace,
            DeclarationKind::Method,
            DeclarationKind::Constant,
            DeclarationKind::ClassVariable,
            DeclarationKind::InstanceVariable,
            DeclarationKind::GlobalVariable,
            DeclarationKind::Alias,
        ] {
            assert_eq!(kind.to_string().parse::<DeclarationKind>(), Ok(kind));
        }
        assert!("Struct".parse::<DeclarationKind>().is_err());
    }

    #[test]
    fn test_compact_string() {
        let s = compact_string("Foo::Bar");
        assert_eq!(&*s, "Foo::Bar");
    }
}
