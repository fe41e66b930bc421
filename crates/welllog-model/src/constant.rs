//! Named header facts and acquisition parameters.

use serde::{Deserialize, Serialize};

/// A named value with unit and description.
///
/// The value is kept as the text found in the file. Numeric access goes
/// through [`Constant::as_f64`], which yields NaN for placeholders such as
/// `"N/A"` or an empty field instead of failing the whole load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub unit: String,
    pub value: String,
    pub description: String,
}

impl Constant {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Numeric value, or NaN when the text does not parse.
    pub fn as_f64(&self) -> f64 {
        self.value.trim().parse().unwrap_or(f64::NAN)
    }

    pub fn set_f64(&mut self, value: f64) {
        self.value = value.to_string();
    }

    /// Numeric equality within `tolerance`. Two unparseable values are never equal.
    pub fn approx_eq(&self, other: &Constant, tolerance: f64) -> bool {
        let (a, b) = (self.as_f64(), other.as_f64());
        !a.is_nan() && !b.is_nan() && (a - b).abs() <= tolerance
    }
}

/// First constant named `name` (case-sensitive).
pub fn find<'a>(list: &'a [Constant], name: &str) -> Option<&'a Constant> {
    list.iter().find(|c| c.name == name)
}

/// Set the first constant named `name`, appending a new one if absent.
pub fn upsert(list: &mut Vec<Constant>, name: &str, value: &str) {
    match list.iter_mut().find(|c| c.name == name) {
        Some(existing) => existing.value = value.to_string(),
        None => list.push(Constant::new(name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_access() {
        let c = Constant::new("BHT", " 187.5 ").with_unit("degF");
        assert_eq!(c.as_f64(), 187.5);
        assert_eq!(c.as_str(), " 187.5 ");
    }

    #[test]
    fn test_unparseable_is_nan() {
        assert!(Constant::new("COMP", "ACME Drilling").as_f64().is_nan());
        assert!(Constant::new("EMPTY", "").as_f64().is_nan());
    }

    #[test]
    fn test_approx_eq_uses_value_not_text() {
        let a = Constant::new("A", "1.0");
        let b = Constant::new("B", "1.00004");
        assert!(a.approx_eq(&b, 1.0e-4));
        assert!(!a.approx_eq(&b, 1.0e-6));
        let nan = Constant::new("C", "abc");
        assert!(!nan.approx_eq(&nan, 1.0));
    }

    #[test]
    fn test_first_match_wins() {
        let mut list = vec![Constant::new("X", "1"), Constant::new("X", "2")];
        assert_eq!(find(&list, "X").unwrap().value, "1");
        assert!(find(&list, "x").is_none());

        upsert(&mut list, "X", "9");
        assert_eq!(list[0].value, "9");
        assert_eq!(list[1].value, "2");

        upsert(&mut list, "Y", "3");
        assert_eq!(list.len(), 3);
    }
}
