//! Cast-safety matrix.
//!
//! Decides whether a column can move from one canonical type to another
//! with `ALTER COLUMN ... TYPE ... USING`, and whether that conversion can
//! lose data or fail at runtime. The matrix is consulted separately for
//! the forward and the reverse direction of every type change.

use serde::{Deserialize, Serialize};

use crate::types::CanonicalType;

/// Outcome of a cast lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastResult {
    /// Whether an automatic conversion exists.
    pub can_cast: bool,
    /// Fragment appended to the column reference, e.g. `::INTEGER`.
    /// Empty when no `USING` clause is needed.
    pub cast_expression: String,
    /// Whether the conversion may lose data or fail on existing rows.
    pub is_risky: bool,
    /// Explanation for risky, lossy-but-defined or impossible conversions.
    pub warning: Option<String>,
}

impl CastResult {
    fn safe(target: &CanonicalType) -> Self {
        Self {
            can_cast: true,
            cast_expression: format!("::{}", target.sql_name()),
            is_risky: false,
            warning: None,
        }
    }

    fn noted(target: &CanonicalType, note: impl Into<String>) -> Self {
        Self {
            warning: Some(note.into()),
            ..Self::safe(target)
        }
    }

    fn risky(target: &CanonicalType, warning: impl Into<String>) -> Self {
        Self {
            is_risky: true,
            warning: Some(warning.into()),
            ..Self::safe(target)
        }
    }

    fn identity() -> Self {
        Self {
            can_cast: true,
            cast_expression: String::new(),
            is_risky: false,
            warning: None,
        }
    }

    fn impossible(from: &CanonicalType, to: &CanonicalType) -> Self {
        Self {
            can_cast: false,
            cast_expression: String::new(),
            is_risky: false,
            warning: Some(format!(
                "No automatic casting available from {from} to {to}. Manual SQL migration required."
            )),
        }
    }

    /// Returns the warning text, or an empty string.
    #[must_use]
    pub fn message(&self) -> &str {
        self.warning.as_deref().unwrap_or_default()
    }
}

/// Looks up the conversion from `from` to `to`.
///
/// Same-type pairs are always safe and need no cast expression. Pairs not
/// in the matrix report `can_cast: false`.
#[must_use]
pub fn can_cast(from: &CanonicalType, to: &CanonicalType) -> CastResult {
    use CanonicalType as T;

    if from == to {
        return CastResult::identity();
    }

    let non_numeric = |ty: &str| {
        format!("Converting {from} to {ty} may fail if text contains non-numeric values")
    };

    match (from, to) {
        (T::BigInt, T::Integer) => CastResult::risky(
            to,
            "Converting BIGINT to INTEGER may fail if values exceed INTEGER range \
             (-2,147,483,648 to 2,147,483,647)",
        ),
        (T::BigInt | T::Integer, T::Text | T::Double | T::Decimal)
        | (T::Integer, T::BigInt)
        | (T::Double | T::Decimal | T::Boolean | T::Timestamp | T::Json, T::Text)
        | (T::Varchar(_), T::Text)
        | (T::Double, T::Decimal) => CastResult::safe(to),

        (T::Integer, T::Boolean) => CastResult::noted(
            to,
            "Converting INTEGER to BOOLEAN: 0 = false, any other value = true",
        ),
        (T::Boolean, T::Integer) => {
            CastResult::noted(to, "Converting BOOLEAN to INTEGER: true = 1, false = 0")
        }

        (T::Varchar(a), T::Varchar(b)) => match (a, b) {
            (Some(a), Some(b)) if b >= a => CastResult::safe(to),
            (_, None) => CastResult::safe(to),
            (_, Some(b)) => CastResult::risky(
                to,
                format!("Converting {from} to {to} may fail if values exceed {b} characters"),
            ),
        },
        (T::Text, T::Varchar(len)) => match len {
            Some(len) => CastResult::risky(
                to,
                format!("Converting TEXT to {to} may fail if values exceed {len} characters"),
            ),
            None => CastResult::safe(to),
        },

        (T::Text | T::Varchar(_), T::Integer | T::BigInt | T::Double | T::Decimal) => {
            CastResult::risky(to, non_numeric(&to.sql_name()))
        }
        (T::Text | T::Varchar(_), T::Boolean) => CastResult::risky(
            to,
            format!(
                "Converting {from} to BOOLEAN may fail if text is not 't', 'f', 'true', \
                 'false', '1', or '0'"
            ),
        ),
        (T::Text | T::Varchar(_), T::Timestamp) => CastResult::risky(
            to,
            format!("Converting {from} to TIMESTAMP may fail if text is not in valid timestamp format"),
        ),
        (T::Text | T::Varchar(_), T::Json) => CastResult::risky(
            to,
            format!("Converting {from} to JSONB may fail if text is not valid JSON"),
        ),

        (T::Double | T::Decimal, T::Integer | T::BigInt) => CastResult::risky(
            to,
            format!("Converting {from} to {to} will truncate decimal places"),
        ),
        (T::Decimal, T::Double) => CastResult::risky(
            to,
            "Converting NUMERIC to DOUBLE PRECISION may lose precision",
        ),

        _ => CastResult::impossible(from, to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CanonicalType as T;

    const ALL: &[CanonicalType] = &[
        T::Text,
        T::Varchar(Some(10)),
        T::Integer,
        T::BigInt,
        T::Double,
        T::Decimal,
        T::Boolean,
        T::Timestamp,
        T::Json,
        T::Bytes,
    ];

    #[test]
    fn test_same_type_is_always_safe() {
        for ty in ALL {
            let result = can_cast(ty, ty);
            assert!(result.can_cast, "{ty}");
            assert!(!result.is_risky, "{ty}");
            assert!(result.cast_expression.is_empty());
        }
        let other = T::Other("userstatus".into());
        assert!(can_cast(&other, &other).can_cast);
    }

    #[test]
    fn test_lookup_is_deterministic() {
        for from in ALL {
            for to in ALL {
                assert_eq!(can_cast(from, to), can_cast(from, to));
            }
        }
    }

    #[test]
    fn test_text_to_integer_is_risky() {
        let result = can_cast(&T::Text, &T::Integer);
        assert!(result.can_cast);
        assert!(result.is_risky);
        assert_eq!(result.cast_expression, "::INTEGER");
        assert!(result.message().contains("non-numeric"));
    }

    #[test]
    fn test_widening_is_safe_but_narrowing_is_risky() {
        let forward = can_cast(&T::Integer, &T::BigInt);
        assert!(forward.can_cast && !forward.is_risky);
        assert_eq!(forward.cast_expression, "::BIGINT");

        let reverse = can_cast(&T::BigInt, &T::Integer);
        assert!(reverse.can_cast && reverse.is_risky);
        assert!(reverse.message().contains("INTEGER range"));
    }

    #[test]
    fn test_informational_note_is_not_risky() {
        let result = can_cast(&T::Integer, &T::Boolean);
        assert!(result.can_cast);
        assert!(!result.is_risky);
        assert!(result.warning.is_some());

        let back = can_cast(&T::Boolean, &T::Integer);
        assert_eq!(back.cast_expression, "::INTEGER");
    }

    #[test]
    fn test_varchar_lengths() {
        assert!(!can_cast(&T::Varchar(Some(10)), &T::Varchar(Some(20))).is_risky);
        assert!(can_cast(&T::Varchar(Some(20)), &T::Varchar(Some(10))).is_risky);
        assert!(!can_cast(&T::Varchar(Some(20)), &T::Text).is_risky);
        let narrowing = can_cast(&T::Text, &T::Varchar(Some(50)));
        assert!(narrowing.is_risky);
        assert_eq!(narrowing.cast_expression, "::VARCHAR(50)");
    }

    #[test]
    fn test_unlisted_pair_requires_manual_migration() {
        let result = can_cast(&T::Timestamp, &T::Integer);
        assert!(!result.can_cast);
        assert_eq!(
            result.message(),
            "No automatic casting available from TIMESTAMP to INTEGER. Manual SQL migration required."
        );
        assert!(!can_cast(&T::Bytes, &T::Text).can_cast);
    }
}
