//! URL slug type for recipe addresses.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum SlugError {
    /// The input produced no usable characters.
    #[error("slug cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains characters outside `[a-z0-9-]`.
    #[error("slug may only contain lowercase letters, digits and hyphens")]
    InvalidCharacter,
}

/// A URL slug identifying a recipe within its owner's namespace.
///
/// Slugs are unique per owner, not globally: two users can both publish
/// `tortilla-de-patatas`. The database enforces the `(owner, slug)`
/// uniqueness constraint.
///
/// ## Constraints
///
/// - Length: 1-120 characters
/// - Characters: `a-z`, `0-9` and `-`
/// - No leading, trailing or doubled hyphens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum length of a slug.
    pub const MAX_LENGTH: usize = 120;

    /// Parse a `Slug` from an already-slugified string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or contains
    /// characters outside `[a-z0-9-]` (including leading/trailing/doubled
    /// hyphens).
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let valid_chars = s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid_chars || s.starts_with('-') || s.ends_with('-') || s.contains("--") {
            return Err(SlugError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from free text such as a recipe title.
    ///
    /// Lowercases, maps accented Latin vowels and `ñ`/`ç` to ASCII, turns
    /// runs of non-alphanumeric characters into single hyphens, and trims
    /// hyphens from both ends.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if no usable characters remain.
    pub fn from_title(title: &str) -> Result<Self, SlugError> {
        let mut out = String::with_capacity(title.len());
        let mut prev_hyphen = true; // suppress a leading hyphen

        for c in title.chars() {
            let mapped = match c.to_lowercase().next().unwrap_or(c) {
                'á' | 'à' | 'ä' | 'â' => Some('a'),
                'é' | 'è' | 'ë' | 'ê' => Some('e'),
                'í' | 'ì' | 'ï' | 'î' => Some('i'),
                'ó' | 'ò' | 'ö' | 'ô' => Some('o'),
                'ú' | 'ù' | 'ü' | 'û' => Some('u'),
                'ñ' => Some('n'),
                'ç' => Some('c'),
                lc if lc.is_ascii_lowercase() || lc.is_ascii_digit() => Some(lc),
                _ => None,
            };

            match mapped {
                Some(lc) => {
                    out.push(lc);
                    prev_hyphen = false;
                }
                None => {
                    if !prev_hyphen {
                        out.push('-');
                        prev_hyphen = true;
                    }
                }
            }
        }

        let trimmed = out.trim_end_matches('-');
        if trimmed.is_empty() {
            return Err(SlugError::Empty);
        }

        let truncated = if trimmed.len() > Self::MAX_LENGTH {
            trimmed
                .get(..Self::MAX_LENGTH)
                .unwrap_or(trimmed)
                .trim_end_matches('-')
        } else {
            trimmed
        };

        Self::parse(truncated)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_title_basic() {
        assert_eq!(
            Slug::from_title("Tortilla de Patatas").unwrap().as_str(),
            "tortilla-de-patatas"
        );
    }

    #[test]
    fn test_from_title_accents() {
        assert_eq!(
            Slug::from_title("Crème Brûlée al Niño").unwrap().as_str(),
            "creme-brulee-al-nino"
        );
    }

    #[test]
    fn test_from_title_collapses_punctuation() {
        assert_eq!(
            Slug::from_title("  ¡Pan!  (100% integral)  ").unwrap().as_str(),
            "pan-100-integral"
        );
    }

    #[test]
    fn test_from_title_empty() {
        assert!(matches!(Slug::from_title("¡¿!?"), Err(SlugError::Empty)));
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(Slug::parse("-leading").is_err());
        assert!(Slug::parse("trailing-").is_err());
        assert!(Slug::parse("double--hyphen").is_err());
        assert!(Slug::parse("Upper").is_err());
        assert!(Slug::parse("").is_err());
    }

    #[test]
    fn test_parse_valid() {
        assert!(Slug::parse("tarta-de-queso-3").is_ok());
    }

    #[test]
    fn test_from_title_truncates() {
        let long = "a ".repeat(200);
        let slug = Slug::from_title(&long).unwrap();
        assert!(slug.as_str().len() <= Slug::MAX_LENGTH);
        assert!(!slug.as_str().ends_with('-'));
    }
}
