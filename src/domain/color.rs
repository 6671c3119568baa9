/// Jelly colors: four named colors plus ten numbered variants.
///
/// Colors compare by exact equality only. A numbered variant is never equal
/// to another numbered variant or to a named color.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Numbered(u8), // 0..=9
}

impl Color {
    /// Parse a map symbol (`r g b y 0-9`).
    pub fn from_symbol(ch: char) -> Option<Color> {
        match ch {
            'r' => Some(Color::Red),
            'g' => Some(Color::Green),
            'b' => Some(Color::Blue),
            'y' => Some(Color::Yellow),
            '0'..='9' => Some(Color::Numbered(ch as u8 - b'0')),
            _ => None,
        }
    }

    /// Map symbol, the inverse of `from_symbol`.
    pub fn symbol(self) -> char {
        match self {
            Color::Red => 'r',
            Color::Green => 'g',
            Color::Blue => 'b',
            Color::Yellow => 'y',
            Color::Numbered(n) => (b'0' + n.min(9)) as char,
        }
    }

    /// Parse a color name as used by grower declarations.
    /// Accepts `red`, `black7`, or the single map symbol.
    pub fn from_name(name: &str) -> Option<Color> {
        match name {
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "blue" => Some(Color::Blue),
            "yellow" => Some(Color::Yellow),
            _ => {
                if let Some(digit) = name.strip_prefix("black") {
                    let mut chars = digit.chars();
                    return match (chars.next(), chars.next()) {
                        (Some(c @ '0'..='9'), None) => Color::from_symbol(c),
                        _ => None,
                    };
                }
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Color::from_symbol(c),
                    _ => None,
                }
            }
        }
    }

    pub fn name(self) -> String {
        match self {
            Color::Red => "red".into(),
            Color::Green => "green".into(),
            Color::Blue => "blue".into(),
            Color::Yellow => "yellow".into(),
            Color::Numbered(n) => format!("black{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_roundtrip() {
        for ch in "rgby0123456789".chars() {
            let c = Color::from_symbol(ch).expect("known symbol");
            assert_eq!(c.symbol(), ch);
        }
    }

    #[test]
    fn unknown_symbols_rejected() {
        assert_eq!(Color::from_symbol('x'), None);
        assert_eq!(Color::from_symbol(' '), None);
        assert_eq!(Color::from_symbol('R'), None);
    }

    #[test]
    fn numbered_variants_are_distinct() {
        assert_ne!(Color::Numbered(0), Color::Numbered(1));
        assert_ne!(Color::Numbered(0), Color::Red);
    }

    #[test]
    fn names() {
        assert_eq!(Color::from_name("blue"), Some(Color::Blue));
        assert_eq!(Color::from_name("black4"), Some(Color::Numbered(4)));
        assert_eq!(Color::from_name("y"), Some(Color::Yellow));
        assert_eq!(Color::from_name("black"), None);
        assert_eq!(Color::from_name("black12"), None);
        assert_eq!(Color::from_name("purple"), None);
        assert_eq!(Color::Numbered(4).name(), "black4");
    }
}
