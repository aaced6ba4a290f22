//! Token kinds and board cells.

/// Number of distinct token kinds.
pub const TOKEN_KINDS: usize = 6;

/// Token kinds (Fire, Water, Wood, Light, Dark, Heart).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    Fire,
    Water,
    Wood,
    Light,
    Dark,
    Heart,
}

impl TokenKind {
    pub const ALL: [Self; TOKEN_KINDS] = [
        Self::Fire,
        Self::Water,
        Self::Wood,
        Self::Light,
        Self::Dark,
        Self::Heart,
    ];

    /// Type tag in `0..TOKEN_KINDS`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Kind for a type tag; `None` when the tag is out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Fire => "Fire",
            Self::Water => "Water",
            Self::Wood => "Wood",
            Self::Light => "Light",
            Self::Dark => "Dark",
            Self::Heart => "Heart",
        }
    }
}

/// Single cell: either cleared and not yet refilled, or holding a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Token(TokenKind),
}

impl Cell {
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    #[inline]
    pub fn token(self) -> Option<TokenKind> {
        match self {
            Self::Empty => None,
            Self::Token(kind) => Some(kind),
        }
    }
}

impl From<TokenKind> for Cell {
    fn from(kind: TokenKind) -> Self {
        Self::Token(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip_covers_all_kinds() {
        for (i, kind) in TokenKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(TokenKind::from_index(i), Some(*kind));
        }
        assert_eq!(TokenKind::from_index(TOKEN_KINDS), None);
    }

    #[test]
    fn test_cell_token() {
        assert_eq!(Cell::Empty.token(), None);
        assert!(Cell::default().is_empty());
        assert_eq!(Cell::from(TokenKind::Dark).token(), Some(TokenKind::Dark));
    }
}
