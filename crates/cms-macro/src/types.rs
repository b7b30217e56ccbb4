//! Macro bracket families.

/// Single-character discriminator of a macro bracket family.
///
/// A macro of type `t` is written `{t ... t}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MacroType {
    /// Data macro: `{% ... %}`
    Data,
    /// Cookie macro (reserved): `{@ ... @}`
    Cookie,
    /// Query string macro: `{? ... ?}`
    QueryString,
    /// Custom macro (reserved): `{# ... #}`
    Custom,
    /// Legacy path macro: `{& ... &}`
    Path,
    /// Localization macro: `{$ ... $}`
    Localization,
}

impl MacroType {
    /// All supported macro types.
    pub const ALL: [MacroType; 6] = [
        MacroType::Data,
        MacroType::Cookie,
        MacroType::QueryString,
        MacroType::Custom,
        MacroType::Path,
        MacroType::Localization,
    ];

    /// Returns the type for a type character, if it is one.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '%' => Some(MacroType::Data),
            '@' => Some(MacroType::Cookie),
            '?' => Some(MacroType::QueryString),
            '#' => Some(MacroType::Custom),
            '&' => Some(MacroType::Path),
            '$' => Some(MacroType::Localization),
            _ => None,
        }
    }

    /// The type character.
    pub fn as_char(self) -> char {
        match self {
            MacroType::Data => '%',
            MacroType::Cookie => '@',
            MacroType::QueryString => '?',
            MacroType::Custom => '#',
            MacroType::Path => '&',
            MacroType::Localization => '$',
        }
    }

    /// Opening bracket, e.g. `{%`.
    pub fn open_bracket(self) -> String {
        format!("{{{}", self.as_char())
    }

    /// Closing bracket, e.g. `%}`.
    pub fn close_bracket(self) -> String {
        format!("{}}}", self.as_char())
    }
}

impl std::fmt::Display for MacroType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
