//! Typed helpers for string-encoded tag values.

use std::fmt;
use std::str::FromStr;

/// Unsigned EXIF rational, written as `n/d` in stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// `None` for a zero denominator.
    pub fn to_f64(self) -> Option<f64> {
        (self.denominator != 0).then(|| self.numerator as f64 / self.denominator as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRationalError(String);

impl fmt::Display for ParseRationalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a rational: '{}'", self.0)
    }
}

impl std::error::Error for ParseRationalError {}

impl FromStr for Rational {
    type Err = ParseRationalError;

    /// Accepts `n/d` or a bare integer `n` (denominator 1).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRationalError(s.to_string());
        let s = s.trim();
        match s.split_once('/') {
            Some((n, d)) => Ok(Rational::new(
                n.trim().parse().map_err(|_| err())?,
                d.trim().parse().map_err(|_| err())?,
            )),
            None => Ok(Rational::new(s.parse().map_err(|_| err())?, 1)),
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Parse a space-separated list, e.g. `"1 2 3"` or `"48/1 51/1 2963/100"`.
pub fn parse_list<T: FromStr>(s: &str) -> Option<Vec<T>> {
    let items: Option<Vec<T>> = s.split_whitespace().map(|p| p.parse().ok()).collect();
    items.filter(|v| !v.is_empty())
}

/// Join values with single spaces.
pub fn join_list<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fraction_and_integer() {
        assert_eq!("1/60".parse::<Rational>().unwrap(), Rational::new(1, 60));
        assert_eq!("72".parse::<Rational>().unwrap(), Rational::new(72, 1));
        assert_eq!(" 28 / 10 ".parse::<Rational>().unwrap(), Rational::new(28, 10));
        assert!("1/x".parse::<Rational>().is_err());
        assert!("-1/2".parse::<Rational>().is_err());
    }

    #[test]
    fn zero_denominator_has_no_float() {
        assert_eq!(Rational::new(1, 0).to_f64(), None);
        assert_eq!(Rational::new(28, 10).to_f64(), Some(2.8));
    }

    #[test]
    fn lists() {
        let rats: Vec<Rational> = parse_list("48/1 51/1 2963/100").unwrap();
        assert_eq!(join_list(&rats), "48/1 51/1 2963/100");
        assert_eq!(parse_list::<u16>("1 2 x"), None);
        assert_eq!(parse_list::<u16>("   "), None);
    }
}
