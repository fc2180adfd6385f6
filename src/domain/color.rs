/// The chameleon's skin colors. Tiles carry the same classification, and a
/// character standing still on a tile of its own color blends in.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Color {
    #[default]
    None,
    Red,
    Green,
    Blue,
    Yellow,
}

impl Color {
    /// Level-file glyph for a floor of this color.
    pub fn from_glyph(ch: char) -> Option<Color> {
        match ch {
            '.' => Some(Color::None),
            'r' => Some(Color::Red),
            'g' => Some(Color::Green),
            'b' => Some(Color::Blue),
            'y' => Some(Color::Yellow),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::None => "none",
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
        }
    }
}
