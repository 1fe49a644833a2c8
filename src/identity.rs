use std::{fmt, str::FromStr};

use percent_encoding::{
    AsciiSet,
    CONTROLS,
    percent_decode_str,
    utf8_percent_encode,
};

use crate::catalog::Category;

/// Bytes escaped inside each key component. `/` separates components and
/// `%` introduces an escape, so both must be encoded.
const KEY_COMPONENT: &AsciiSet = &CONTROLS.add(b'/').add(b'%').add(b' ');

/// A stable venue identifier derived from (abbreviation, category, field).
///
/// The string form is `field/category/abbreviation` with each component
/// percent-encoded, so it round-trips through [`FromStr`] no matter what
/// characters the names contain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemIdentity {
    abbreviation: String,
    category: Category,
    field: String,
}

impl ItemIdentity {
    pub fn new(abbreviation: &str, category: Category, field: &str) -> Self {
        Self {
            abbreviation: abbreviation.to_string(),
            category,
            field: field.to_string(),
        }
    }

    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// The persisted and rendered key.
    pub fn key(&self) -> String {
        format!(
            "{}/{}/{}",
            utf8_percent_encode(&self.field, KEY_COMPONENT),
            self.category.name(),
            utf8_percent_encode(&self.abbreviation, KEY_COMPONENT)
        )
    }
}

impl fmt::Display for ItemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Error returned when a key string is not a valid identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid venue key '{0}'")]
pub struct InvalidKey(pub String);

impl FromStr for ItemIdentity {
    type Err = InvalidKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidKey(s.to_string());

        let mut parts = s.split('/');
        let (Some(field), Some(category), Some(abbreviation), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let category: Category = category.parse().map_err(|_| invalid())?;
        let decode = |part: &str| {
            percent_decode_str(part)
                .decode_utf8()
                .map(|c| c.into_owned())
                .map_err(|_| invalid())
        };

        Ok(Self {
            abbreviation: decode(abbreviation)?,
            category,
            field: decode(field)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ItemIdentity::new("AAAI", Category::Conference, "AI");
        let b = ItemIdentity::new("AAAI", Category::Conference, "AI");
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn different_category_differs() {
        let a = ItemIdentity::new("TOG", Category::Journal, "Graphics");
        let b = ItemIdentity::new("TOG", Category::Conference, "Graphics");
        assert_ne!(a, b);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn plain_key_is_readable() {
        let id = ItemIdentity::new("AAAI", Category::Conference, "AI");
        assert_eq!(id.key(), "AI/Conference/AAAI");
        assert_eq!(id.to_string(), id.key());
    }

    #[test]
    fn separators_in_names_are_escaped() {
        let id = ItemIdentity::new("A/B", Category::Journal, "Nets/Comms 100%");
        assert_eq!(id.key(), "Nets%2FComms%20100%25/Journal/A%2FB");

        let parsed: ItemIdentity = id.key().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn names_that_would_collide_as_plain_strings_stay_distinct() {
        let a = ItemIdentity::new("X/Journal/Y", Category::Journal, "F");
        let b = ItemIdentity::new("Y", Category::Journal, "F/Journal/X");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn non_ascii_round_trips() {
        let id =
            ItemIdentity::new("Ψ-Conf", Category::Conference, "理论计算机");
        let parsed: ItemIdentity = id.key().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!("".parse::<ItemIdentity>().is_err());
        assert!("AI/Conference".parse::<ItemIdentity>().is_err());
        assert!("AI/Conference/AAAI/extra".parse::<ItemIdentity>().is_err());
        assert!("AI/Workshop/AAAI".parse::<ItemIdentity>().is_err());
        assert!("AI/Conference/%FF".parse::<ItemIdentity>().is_err());
    }
}
