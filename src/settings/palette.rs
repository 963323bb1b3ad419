// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Pick an entry from a list of named things, either by position or by name.
///
/// Names are matched ignoring case, and with spaces, dashes and underscores treated the same, so
/// `"Red Yellow Blue"`, `"red_yellow_blue"` and `"RED-YELLOW blue"` all pick the same palette.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub(crate) enum Choice {
    Index(usize),
    Name(String),
}

impl Default for Choice {
    fn default() -> Self {
        Self::Index(0)
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase().replace(&[' ', '-'][..], "_")
}

impl Choice {
    /// The index of the chosen entry in `names`, or `None` if there is no such entry.
    pub(crate) fn resolve<'a, I>(&self, names: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            Choice::Index(index) => {
                let index = *index;
                names.into_iter().nth(index).map(|_| index)
            }
            Choice::Name(name) => {
                let wanted = normalize_name(name);
                names
                    .into_iter()
                    .position(|candidate| normalize_name(candidate) == wanted)
            }
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Index(index) => write!(f, "{}", index),
            Choice::Name(name) => write!(f, "\"{}\"", name),
        }
    }
}

impl FromStr for Choice {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.trim()
            .parse()
            .map(Choice::Index)
            .unwrap_or_else(|_| Choice::Name(s.to_string())))
    }
}

#[cfg(test)]
mod test {
    use serde::Deserialize;

    use super::Choice;

    const NAMES: [&str; 4] = ["White Hot", "Black Hot", "Turbo", "Red Yellow Blue"];

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        palette: Choice,
    }

    fn parse_toml(value: &str) -> Choice {
        toml::from_str::<Wrapper>(&format!("palette = {}", value))
            .unwrap()
            .palette
    }

    #[test]
    fn index() {
        assert_eq!(parse_toml("2"), Choice::Index(2));
        assert_eq!(Choice::Index(2).resolve(NAMES.iter().copied()), Some(2));
        assert_eq!(Choice::Index(4).resolve(NAMES.iter().copied()), None);
    }

    #[test]
    fn all_uppercase() {
        let choice = parse_toml("\"TURBO\"");
        assert_eq!(choice.resolve(NAMES.iter().copied()), Some(2));
    }

    #[test]
    fn spongebob_case() {
        let choice = parse_toml("\"tUrBo\"");
        assert_eq!(choice.resolve(NAMES.iter().copied()), Some(2));
    }

    #[test]
    fn mixed_separators() {
        for name in &["RED_YELLOW_BLUE", "red yellow blue", "Red-Yellow_blue"] {
            let choice = Choice::Name(name.to_string());
            assert_eq!(choice.resolve(NAMES.iter().copied()), Some(3), "{}", name);
        }
    }

    #[test]
    fn unknown_name() {
        let choice = parse_toml("\"Not A Palette\"");
        assert_eq!(choice.resolve(NAMES.iter().copied()), None);
    }

    #[test]
    fn from_command_line() {
        assert_eq!("3".parse::<Choice>(), Ok(Choice::Index(3)));
        assert_eq!(
            "White Hot".parse::<Choice>(),
            Ok(Choice::Name("White Hot".to_string()))
        );
    }
}
