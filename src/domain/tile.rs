/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use super::color::Color;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Wall,
    Floor(Color),
}

impl Tile {
    /// Does this tile block movement?
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// The color a character must wear to blend into this tile.
    /// Walls have no camouflage color.
    pub fn camouflage(self) -> Color {
        match self {
            Tile::Wall => Color::None,
            Tile::Floor(color) => color,
        }
    }

    pub fn from_glyph(ch: char) -> Option<Tile> {
        match ch {
            '=' => Some(Tile::Wall),
            other => Color::from_glyph(other).map(Tile::Floor),
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Floor(Color::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walls_are_solid_and_colorless() {
        assert!(Tile::Wall.is_solid());
        assert_eq!(Tile::Wall.camouflage(), Color::None);
    }

    #[test]
    fn floors_carry_their_color() {
        let t = Tile::Floor(Color::Green);
        assert!(!t.is_solid());
        assert_eq!(t.camouflage(), Color::Green);
    }

    #[test]
    fn glyphs() {
        assert_eq!(Tile::from_glyph('='), Some(Tile::Wall));
        assert_eq!(Tile::from_glyph('y'), Some(Tile::Floor(Color::Yellow)));
        assert_eq!(Tile::from_glyph('.'), Some(Tile::Floor(Color::None)));
        assert_eq!(Tile::from_glyph('?'), None);
    }
}
