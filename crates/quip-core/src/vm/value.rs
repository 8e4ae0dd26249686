//! Runtime value representation for the Quip virtual machine

use crate::bytecode::Literal;

/// A runtime value
///
/// The language has two value kinds: IEEE double-precision numbers and
/// immutable text. Booleans are encoded as the numbers `1.0` and `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// The boolean encoding of `value`
    #[must_use]
    pub const fn truth(value: bool) -> Self {
        Value::Number(if value { 1.0 } else { 0.0 })
    }

    /// Name of this value's kind, for error messages
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
        }
    }

    /// Truth coercion: zero and NaN are false, the empty text is false,
    /// everything else is true
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Number(n) => Value::Number(*n),
            Literal::Text(s) => Value::Text(s.clone()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", render_number(*n)),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Render a number in a general, precision-limited decimal form
///
/// Six significant digits, trailing zeros removed. Magnitudes at or above
/// 10^6 and below 10^-4 switch to exponential notation.
fn render_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let exponent = decimal_exponent(value);

    if exponent < -4 || exponent >= 6 {
        trim_exponential(&format!("{value:.5e}"))
    } else {
        let decimals = usize::try_from(5 - exponent).unwrap_or(0);
        trim_fraction(&format!("{value:.decimals$}"))
    }
}

/// Decimal exponent of a finite nonzero double (the e in d.ddd * 10^e),
/// taken from the standard exponential formatting so power-of-ten
/// boundaries come out exact
fn decimal_exponent(value: f64) -> i32 {
    format!("{value:e}")
        .split('e')
        .nth(1)
        .and_then(|exp| exp.parse().ok())
        .unwrap_or(0)
}

/// Drop a trailing zero run (and a bare point) from a fixed-form number
fn trim_fraction(formatted: &str) -> String {
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted.to_string()
    }
}

/// Drop a trailing zero run from the mantissa of an exponential-form number
fn trim_exponential(formatted: &str) -> String {
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
            format!("{mantissa}e{exponent}")
        }
        None => formatted.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(value: f64) -> String {
        Value::Number(value).to_string()
    }

    #[test]
    fn integers_render_without_fraction() {
        assert_eq!(rendered(0.0), "0");
        assert_eq!(rendered(42.0), "42");
        assert_eq!(rendered(-7.0), "-7");
        assert_eq!(rendered(100000.0), "100000");
    }

    #[test]
    fn fractions_render_to_six_significant_digits() {
        assert_eq!(rendered(3.14159265), "3.14159");
        assert_eq!(rendered(1.0 / 3.0), "0.333333");
        assert_eq!(rendered(0.1 + 0.2), "0.3");
        assert_eq!(rendered(2.5), "2.5");
    }

    #[test]
    fn large_and_small_magnitudes_use_exponential() {
        assert_eq!(rendered(1_000_000.0), "1e6");
        assert_eq!(rendered(1_234_567.0), "1.23457e6");
        assert_eq!(rendered(0.00001), "1e-5");
        assert_eq!(rendered(-2_500_000.0), "-2.5e6");
    }

    #[test]
    fn special_values_render_by_name() {
        assert_eq!(rendered(f64::NAN), "nan");
        assert_eq!(rendered(f64::INFINITY), "inf");
        assert_eq!(rendered(f64::NEG_INFINITY), "-inf");
        assert_eq!(rendered(-0.0), "-0");
    }

    #[test]
    fn text_renders_verbatim() {
        assert_eq!(Value::Text("hello\nworld".to_string()).to_string(), "hello\nworld");
    }

    #[test]
    fn truthiness_table() {
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(-0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::Number(0.5).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::Number(f64::INFINITY).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(Value::Text("0".to_string()).is_truthy());
    }

    #[test]
    fn truth_encodes_booleans_as_numbers() {
        assert_eq!(Value::truth(true), Value::Number(1.0));
        assert_eq!(Value::truth(false), Value::Number(0.0));
    }

    #[test]
    fn values_from_literals() {
        assert_eq!(Value::from(&Literal::Number(2.0)), Value::Number(2.0));
        assert_eq!(
            Value::from(&Literal::Text("hi".to_string())),
            Value::Text("hi".to_string())
        );
    }

    #[test]
    fn equality_follows_ieee_and_kind() {
        assert_eq!(Value::Number(1.0), Value::Number(1.0));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_ne!(Value::Number(0.0), Value::Text("0".to_string()));
    }
}
