//! Case-insensitive parsing for the closed label sets stored as strings
//! (categories, discount kinds, campaign source/status, click actions).
//!
//! Every label enum goes through the same two entry points so the fallback
//! policy lives in one place: [`LenientEnum::parse_lenient`] reports a miss as
//! `None`, [`LenientEnum::parse_or`] substitutes an explicit default.

pub trait LenientEnum: Sized + Copy + 'static {
    /// All members, in declaration order.
    const VARIANTS: &'static [Self];

    /// Canonical lowercase label used for storage and serialization.
    fn as_str(&self) -> &'static str;

    /// Matches `value` against the canonical labels ignoring ASCII case and
    /// surrounding whitespace. `-` and space are treated as `_`.
    fn parse_lenient(value: &str) -> Option<Self> {
        let normalized = normalize_label(value);
        if normalized.is_empty() {
            return None;
        }

        Self::VARIANTS.iter().copied().find(|variant| variant.as_str() == normalized)
    }

    fn parse_or(value: &str, default: Self) -> Self {
        Self::parse_lenient(value).unwrap_or(default)
    }

    fn labels() -> Vec<&'static str> {
        Self::VARIANTS.iter().map(|variant| variant.as_str()).collect()
    }
}

pub(crate) fn normalize_label(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

/// Implements `Display` and `FromStr` for a [`LenientEnum`] in terms of its
/// canonical labels. `FromStr` is lenient on case but still rejects unknown
/// labels.
macro_rules! lenient_label_impls {
    ($ty:ty, $what:literal) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::lenient::LenientEnum::as_str(self))
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::errors::DomainError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                <$ty as $crate::lenient::LenientEnum>::parse_lenient(value).ok_or_else(|| {
                    $crate::errors::DomainError::InvalidInput(format!(
                        "unknown {} `{}` (expected {})",
                        $what,
                        value.trim(),
                        <$ty as $crate::lenient::LenientEnum>::labels().join("|")
                    ))
                })
            }
        }
    };
}

pub(crate) use lenient_label_impls;
