//! Named preset patterns that can be stamped onto the board.
//!
//! Presets live at fixed offsets; they are never shifted or clamped to fit
//! a smaller board.

use std::str::FromStr;

use crate::board::BoardError;

/// Diagonal offsets at which the glider preset is repeated.
const GLIDER_OFFSETS: [usize; 4] = [5, 9, 13, 17];

/// A named preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Four gliders marching down the main diagonal.
    Gliders,
    /// A period-2 oscillator.
    Blinker,
    /// A 2x2 still life.
    Block,
}

impl Pattern {
    /// Lowercase name, the same string [`FromStr`] accepts.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gliders => "gliders",
            Self::Blinker => "blinker",
            Self::Block => "block",
        }
    }

    /// Live cells of this preset as `(i, j)` coordinates.
    pub fn cells(self) -> Vec<(usize, usize)> {
        match self {
            Self::Gliders => GLIDER_OFFSETS
                .iter()
                .flat_map(|&k| {
                    [
                        (k.saturating_add(1), k.saturating_add(1)),
                        (k.saturating_add(2), k.saturating_add(2)),
                        (k.saturating_add(3), k.saturating_add(2)),
                        (k.saturating_add(1), k.saturating_add(3)),
                        (k.saturating_add(2), k.saturating_add(3)),
                    ]
                })
                .collect(),
            Self::Blinker => vec![(1, 2), (2, 2), (3, 2)],
            Self::Block => vec![(1, 1), (1, 2), (2, 1), (2, 2)],
        }
    }
}

impl FromStr for Pattern {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gliders" | "glider" | "sliders" => Ok(Self::Gliders),
            "blinker" => Ok(Self::Blinker),
            "block" => Ok(Self::Block),
            other => Err(BoardError::UnknownPattern(other.to_owned())),
        }
    }
}

impl core::fmt::Display for Pattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glider_preset_matches_reference_layout() {
        let cells = Pattern::Gliders.cells();
        assert_eq!(cells.len(), 20);
        assert_eq!(
            cells.get(..5),
            Some(&[(6, 6), (7, 7), (8, 7), (6, 8), (7, 8)][..])
        );
        let max_i = cells.iter().map(|&(i, _)| i).max();
        let max_j = cells.iter().map(|&(_, j)| j).max();
        assert_eq!(max_i, Some(20));
        assert_eq!(max_j, Some(20));
    }

    #[test]
    fn parse_names() {
        assert_eq!("Gliders".parse::<Pattern>(), Ok(Pattern::Gliders));
        assert_eq!("sliders".parse::<Pattern>(), Ok(Pattern::Gliders));
        assert_eq!(" block ".parse::<Pattern>(), Ok(Pattern::Block));
        assert_eq!(
            "pulsar".parse::<Pattern>(),
            Err(BoardError::UnknownPattern("pulsar".to_owned()))
        );
    }

    #[test]
    fn display_round_trips() {
        for pattern in [Pattern::Gliders, Pattern::Blinker, Pattern::Block] {
            assert_eq!(pattern.to_string().parse::<Pattern>(), Ok(pattern));
        }
    }
}
