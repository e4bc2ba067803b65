use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;

/// How dense the generated beatmap is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    /// Keep every `stride`-th aligned note.
    pub fn stride(self) -> usize {
        match self {
            Difficulty::Easy => 4,
            Difficulty::Normal => 2,
            Difficulty::Hard => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    /// Parse a 1-based menu choice. Anything else is `None`.
    pub fn from_menu_choice(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Difficulty::Easy),
            "2" => Some(Difficulty::Normal),
            "3" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Menu text listing every level with its 1-based number.
    pub fn menu() -> String {
        let mut text = String::from("Choose difficulty:\n");
        for (i, level) in Self::ALL.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, level));
        }
        text
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_match_levels() {
        assert_eq!(Difficulty::Easy.stride(), 4);
        assert_eq!(Difficulty::Normal.stride(), 2);
        assert_eq!(Difficulty::Hard.stride(), 1);
    }

    #[test]
    fn menu_choices() {
        assert_eq!(Difficulty::from_menu_choice("1"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_menu_choice(" 2\n"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_menu_choice("3"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_menu_choice("4"), None);
        assert_eq!(Difficulty::from_menu_choice("hard"), None);
        assert_eq!(Difficulty::from_menu_choice(""), None);
    }

    #[test]
    fn menu_lists_levels_in_order() {
        assert_eq!(Difficulty::menu(), "Choose difficulty:\n1. Easy\n2. Normal\n3. Hard\n");
    }

    #[test]
    fn deserializes_lowercase_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: Difficulty,
        }
        let w: Wrapper = toml::from_str("level = \"hard\"").unwrap();
        assert_eq!(w.level, Difficulty::Hard);
    }
}
