//! Collation id → character set name table (spec §9: "a small, immutable process-wide table
//! of known collation ids is acceptable").

/// A MySQL/MariaDB character set, identified by its collation id on the wire.
///
/// This is deliberately a small, curated subset of the full collation table (hundreds of
/// entries across MySQL/MariaDB versions) covering the collations a client is actually likely
/// to negotiate or request; anything else resolves to [`Error::UnknownCharacterSet`] rather
/// than guessing.
///
/// [`Error::UnknownCharacterSet`]: crate::error::Error::UnknownCharacterSet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterSet {
    pub collation_id: u16,
    pub name: &'static str,
}

impl CharacterSet {
    pub const UTF8MB4_GENERAL_CI: CharacterSet = CharacterSet {
        collation_id: 45,
        name: "utf8mb4",
    };
    pub const UTF8MB4_UNICODE_CI: CharacterSet = CharacterSet {
        collation_id: 224,
        name: "utf8mb4",
    };
    pub const UTF8MB4_0900_AI_CI: CharacterSet = CharacterSet {
        collation_id: 255,
        name: "utf8mb4",
    };
    pub const UTF8_GENERAL_CI: CharacterSet = CharacterSet {
        collation_id: 33,
        name: "utf8",
    };
    pub const LATIN1_SWEDISH_CI: CharacterSet = CharacterSet {
        collation_id: 8,
        name: "latin1",
    };
    pub const BINARY: CharacterSet = CharacterSet {
        collation_id: 63,
        name: "binary",
    };

    const KNOWN: &'static [CharacterSet] = &[
        Self::UTF8MB4_GENERAL_CI,
        Self::UTF8MB4_UNICODE_CI,
        Self::UTF8MB4_0900_AI_CI,
        Self::UTF8_GENERAL_CI,
        Self::LATIN1_SWEDISH_CI,
        Self::BINARY,
    ];

    pub fn from_collation_id(id: u16) -> Option<CharacterSet> {
        Self::KNOWN.iter().copied().find(|cs| cs.collation_id == id)
    }

    pub fn by_name(name: &str) -> Option<CharacterSet> {
        Self::KNOWN
            .iter()
            .copied()
            .find(|cs| cs.name.eq_ignore_ascii_case(name))
    }
}

impl Default for CharacterSet {
    fn default() -> Self {
        Self::UTF8MB4_GENERAL_CI
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_collation() {
        assert_eq!(
            CharacterSet::from_collation_id(45),
            Some(CharacterSet::UTF8MB4_GENERAL_CI)
        );
    }

    #[test]
    fn unknown_collation_is_none() {
        assert_eq!(CharacterSet::from_collation_id(9999), None);
    }

    #[test]
    fn by_name_is_case_insensitive() {
        assert_eq!(CharacterSet::by_name("UTF8MB4"), Some(CharacterSet::UTF8MB4_GENERAL_CI));
    }
}
