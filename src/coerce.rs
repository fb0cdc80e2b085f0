/// Outcome of coercing one raw CSV field.
///
/// Blank/missing cells are stored as zero but reported separately from an
/// explicit `0` in the source, so the run summary can say how many values
/// were defaulted. Non-blank garbage is `Invalid` and fails the row.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced<T> {
    Value(T),
    Defaulted,
    Invalid(String),
}

impl<T: Copy> Coerced<T> {
    /// Collapse to the stored value, counting defaults, or fail the row.
    pub fn resolve(&self, zero: T, defaulted: &mut usize) -> Result<T, String> {
        match self {
            Coerced::Value(v) => Ok(*v),
            Coerced::Defaulted => {
                *defaulted += 1;
                Ok(zero)
            }
            Coerced::Invalid(reason) => Err(reason.clone()),
        }
    }
}

/// Counting stats arrive as integers but some exports render them as
/// decimals ("2.0"); accept either, rounding to the nearest integer.
pub fn parse_int(raw: &str) -> Coerced<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return Coerced::Defaulted;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Coerced::Value(v.round() as i64),
        _ => Coerced::Invalid(format!("not a number: {s:?}")),
    }
}

pub fn parse_real(raw: &str) -> Coerced<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Coerced::Defaulted;
    }
    match s.parse::<f64>() {
        // Expected-goals feeds carry three decimals; keep storage consistent.
        Ok(v) if v.is_finite() => Coerced::Value((v * 1000.0).round() / 1000.0),
        _ => Coerced::Invalid(format!("not a number: {s:?}")),
    }
}

/// "MF,FW" → "MF". Multi-valued position strings keep only the first role
/// for the player's primary position.
pub fn primary_position(raw: &str) -> String {
    raw.split(',').next().unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_defaults_and_garbage_fails() {
        assert_eq!(parse_int(""), Coerced::Defaulted);
        assert_eq!(parse_int("  "), Coerced::Defaulted);
        assert_eq!(parse_int("7"), Coerced::Value(7));
        assert_eq!(parse_int("2.0"), Coerced::Value(2));
        assert!(matches!(parse_int("n/a"), Coerced::Invalid(_)));

        assert_eq!(parse_real(""), Coerced::Defaulted);
        assert_eq!(parse_real("0.1234"), Coerced::Value(0.123));
        assert!(matches!(parse_real("-"), Coerced::Invalid(_)));
    }

    #[test]
    fn resolve_counts_defaults() {
        let mut defaulted = 0usize;
        assert_eq!(parse_int("3").resolve(0, &mut defaulted), Ok(3));
        assert_eq!(parse_int("").resolve(0, &mut defaulted), Ok(0));
        assert_eq!(defaulted, 1);
        assert!(parse_int("x").resolve(0, &mut defaulted).is_err());
    }

    #[test]
    fn primary_position_truncates() {
        assert_eq!(primary_position("MF,FW"), "MF");
        assert_eq!(primary_position(" GK "), "GK");
        assert_eq!(primary_position(""), "");
    }
}
