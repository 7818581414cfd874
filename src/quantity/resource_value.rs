//! Resource quantities with exact integer unit conversion.

use super::QuantityError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Unit is the suffix of a resource quantity.
///
/// `Milli` (`m`) is the CPU millicore scale; `None` is a bare count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Milli,
    None,
    K,
    M,
    G,
    T,
    P,
    Ki,
    Mi,
    Gi,
    Ti,
    Pi,
}

impl Unit {
    /// Parses a unit suffix. Suffixes are case-sensitive, except that both
    /// `k` and `K` denote the decimal kilo.
    pub fn from_suffix(suffix: &str) -> Option<Unit> {
        let unit = match suffix {
            "m" => Unit::Milli,
            "" => Unit::None,
            "k" | "K" => Unit::K,
            "M" => Unit::M,
            "G" => Unit::G,
            "T" => Unit::T,
            "P" => Unit::P,
            "Ki" => Unit::Ki,
            "Mi" => Unit::Mi,
            "Gi" => Unit::Gi,
            "Ti" => Unit::Ti,
            "Pi" => Unit::Pi,
            _ => return None,
        };
        Some(unit)
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::Milli => "m",
            Unit::None => "",
            Unit::K => "k",
            Unit::M => "M",
            Unit::G => "G",
            Unit::T => "T",
            Unit::P => "P",
            Unit::Ki => "Ki",
            Unit::Mi => "Mi",
            Unit::Gi => "Gi",
            Unit::Ti => "Ti",
            Unit::Pi => "Pi",
        }
    }

    /// Number of absolute steps in one of this unit. The absolute scale is
    /// thousandths of a bare count so that millicores stay integral.
    pub fn scale(&self) -> u128 {
        const MILLI_PER_ONE: u128 = 1000;
        let factor: u128 = match self {
            Unit::Milli => return 1,
            Unit::None => 1,
            Unit::K => 1000,
            Unit::M => 1000u128.pow(2),
            Unit::G => 1000u128.pow(3),
            Unit::T => 1000u128.pow(4),
            Unit::P => 1000u128.pow(5),
            Unit::Ki => 1024,
            Unit::Mi => 1024u128.pow(2),
            Unit::Gi => 1024u128.pow(3),
            Unit::Ti => 1024u128.pow(4),
            Unit::Pi => 1024u128.pow(5),
        };
        factor * MILLI_PER_ONE
    }

    /// Converts a count of this unit into absolute steps.
    pub fn to_absolute_value(&self, relative: u64) -> Option<u128> {
        u128::from(relative).checked_mul(self.scale())
    }

    /// Converts absolute steps into a whole count of this unit, truncating.
    pub fn from_absolute_value(&self, absolute: u128) -> u128 {
        absolute / self.scale()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// ResourceValue is a parsed quantity such as `64Mi`, `2` or `500m`.
///
/// Equality and ordering compare the absolute value only, so `1Ki` equals
/// `1024` and `1k` is less than `1Ki`.
#[derive(Debug, Clone, Copy)]
pub struct ResourceValue {
    absolute: u128,
    unit: Unit,
}

impl ResourceValue {
    /// Parses `<integer><optional-unit-suffix>`.
    pub fn parse(input: &str) -> Result<ResourceValue, QuantityError> {
        let digits_end = input
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(input.len());
        let (digits, suffix) = input.split_at(digits_end);
        if digits.is_empty() {
            return Err(QuantityError::malformed(input, "expected an integer amount"));
        }
        if suffix.starts_with('.') {
            return Err(QuantityError::malformed(input, "fractional amounts are not supported"));
        }
        let unit = Unit::from_suffix(suffix)
            .ok_or_else(|| QuantityError::malformed(input, format!("unknown unit {:?}", suffix)))?;
        let relative: u64 = digits
            .parse()
            .map_err(|_| QuantityError::malformed(input, "amount out of range"))?;
        let absolute = unit
            .to_absolute_value(relative)
            .ok_or_else(|| QuantityError::malformed(input, "amount out of range"))?;
        Ok(ResourceValue { absolute, unit })
    }

    pub fn absolute_value(&self) -> u128 {
        self.absolute
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Returns the whole count of this value's own unit.
    pub fn relative_value(&self) -> u128 {
        self.unit.from_absolute_value(self.absolute)
    }

    /// Re-expresses the same absolute value in `unit`.
    ///
    /// Display of the result truncates to a whole count of `unit`.
    pub fn convert_to(&self, unit: Unit) -> ResourceValue {
        ResourceValue {
            absolute: self.absolute,
            unit,
        }
    }

    /// Returns true if this value is strictly larger than `other`.
    pub fn exceeds(&self, other: &ResourceValue) -> bool {
        self > other
    }
}

impl FromStr for ResourceValue {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceValue::parse(s)
    }
}

impl PartialEq for ResourceValue {
    fn eq(&self, other: &Self) -> bool {
        self.absolute == other.absolute
    }
}

impl Eq for ResourceValue {}

impl PartialOrd for ResourceValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResourceValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.absolute.cmp(&other.absolute)
    }
}

impl fmt::Display for ResourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.relative_value(), self.unit)
    }
}

/// Ratio is a positive rational threshold such as `2`, `1.5` or `3/2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    numerator: u64,
    denominator: u64,
}

impl Ratio {
    pub fn new(numerator: u64, denominator: u64) -> Option<Ratio> {
        if numerator == 0 || denominator == 0 {
            return None;
        }
        Some(Ratio {
            numerator,
            denominator,
        })
    }

    pub fn parse(input: &str) -> Result<Ratio, QuantityError> {
        let invalid = |reason: &str| QuantityError::malformed(input, reason);
        let parse_int = |s: &str| -> Result<u64, QuantityError> {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("expected a positive number"));
            }
            s.parse().map_err(|_| invalid("ratio out of range"))
        };

        let (numerator, denominator) = if let Some((n, d)) = input.split_once('/') {
            (parse_int(n.trim())?, parse_int(d.trim())?)
        } else if let Some((whole, frac)) = input.split_once('.') {
            let digits = format!("{}{}", whole, frac);
            let exp = u32::try_from(frac.len()).map_err(|_| invalid("ratio out of range"))?;
            let denominator = 10u64
                .checked_pow(exp)
                .ok_or_else(|| invalid("ratio out of range"))?;
            (parse_int(&digits)?, denominator)
        } else {
            (parse_int(input.trim())?, 1)
        };

        Ratio::new(numerator, denominator).ok_or_else(|| invalid("ratio must be positive"))
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }
}

impl FromStr for Ratio {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ratio::parse(s)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

/// Returns true iff `limit > request * max_ratio`, compared exactly.
pub fn exceeds_ratio(limit: &ResourceValue, request: &ResourceValue, max_ratio: Ratio) -> bool {
    let lhs = limit
        .absolute
        .checked_mul(u128::from(max_ratio.denominator));
    let rhs = request
        .absolute
        .checked_mul(u128::from(max_ratio.numerator));
    match (lhs, rhs) {
        (Some(lhs), Some(rhs)) => lhs > rhs,
        // Only reachable for absurd magnitudes; fall back to approximate.
        _ => {
            limit.absolute as f64 * max_ratio.denominator as f64
                > request.absolute as f64 * max_ratio.numerator as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_units_round_trip_exactly() {
        let units = [
            Unit::K,
            Unit::M,
            Unit::G,
            Unit::T,
            Unit::P,
            Unit::Ki,
            Unit::Mi,
            Unit::Gi,
            Unit::Ti,
            Unit::Pi,
        ];
        for unit in units {
            for n in [10u128, 100, 1000] {
                let value = ResourceValue::parse(&format!("{}{}", n, unit)).unwrap();
                assert_eq!(value.unit(), unit);
                assert_eq!(unit.from_absolute_value(value.absolute_value()), n, "{}{}", n, unit);
            }
        }
    }

    #[test]
    fn test_parse_plain_and_milli() {
        let two = ResourceValue::parse("2").unwrap();
        assert_eq!(two.unit(), Unit::None);
        assert_eq!(two.to_string(), "2");

        let half = ResourceValue::parse("500m").unwrap();
        assert_eq!(half.unit(), Unit::Milli);
        assert!(two.exceeds(&half));
        assert_eq!(ResourceValue::parse("1000m").unwrap(), ResourceValue::parse("1").unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "Mi", "1.5Gi", "-1", "+1", "64mi", "64MB", "10 Mi", "1e3"] {
            let err = ResourceValue::parse(input).unwrap_err();
            assert!(
                matches!(err, QuantityError::Malformed { .. }),
                "{:?} should be rejected",
                input
            );
        }
        assert!(ResourceValue::parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_parse_reports_fractional_amounts() {
        assert_eq!(
            ResourceValue::parse("1.5Gi").unwrap_err().to_string(),
            "malformed quantity \"1.5Gi\": fractional amounts are not supported"
        );
    }

    #[test]
    fn test_compare_across_units() {
        let gi = ResourceValue::parse("1Gi").unwrap();
        let mi = ResourceValue::parse("1024Mi").unwrap();
        assert_eq!(gi, mi);
        assert_eq!(gi.cmp(&mi), Ordering::Equal);

        let k = ResourceValue::parse("1k").unwrap();
        let ki = ResourceValue::parse("1Ki").unwrap();
        assert!(k < ki);
        assert_eq!(ResourceValue::parse("1K").unwrap(), k);
        assert!(ResourceValue::parse("1G").unwrap() < gi);
    }

    #[test]
    fn test_convert_to_truncates() {
        let limit = ResourceValue::parse("2Gi").unwrap();
        assert_eq!(limit.convert_to(Unit::Mi).to_string(), "2048Mi");
        assert_eq!(limit.convert_to(Unit::G).to_string(), "2G");
        assert_eq!(limit.convert_to(Unit::M).to_string(), "2147M");
    }

    #[test]
    fn test_ratio_parse() {
        assert_eq!(Ratio::parse("2").unwrap(), Ratio::new(2, 1).unwrap());
        assert_eq!(Ratio::parse("1.5").unwrap(), Ratio::new(15, 10).unwrap());
        assert_eq!(Ratio::parse("3/2").unwrap(), Ratio::new(3, 2).unwrap());
        assert_eq!(Ratio::parse("3/2").unwrap().to_string(), "3/2");
        for input in ["", "0", "-2", "a", "1/0", "1.x"] {
            assert!(Ratio::parse(input).is_err(), "{:?}", input);
        }
    }

    #[test]
    fn test_exceeds_ratio() {
        let limit = ResourceValue::parse("1Gi").unwrap();
        let request = ResourceValue::parse("64Mi").unwrap();
        assert!(exceeds_ratio(&limit, &request, Ratio::parse("2").unwrap()));
        assert!(!exceeds_ratio(&limit, &request, Ratio::parse("20").unwrap()));
        assert!(!exceeds_ratio(&limit, &request, Ratio::parse("16").unwrap()));
        assert!(exceeds_ratio(&limit, &request, Ratio::parse("15.9").unwrap()));
    }
}
