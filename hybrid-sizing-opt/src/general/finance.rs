/// Round `value` to `decimals` places after the decimal point
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Capital recovery (annuity) factor, rounded to 6 decimal places.
///
/// crf = r (1+r)^n / ((1+r)^n - 1)
///
/// Converts an up-front capital cost into the equivalent uniform annual payment
/// over `years` at discount rate `rate`. A zero rate degenerates to `1 / years`.
pub fn capital_recovery_factor(rate: f64, years: u32) -> f64 {
    let n = years as f64;
    if rate == 0.0 {
        return round_to(1.0 / n, 6);
    }
    let growth = (1.0 + rate).powf(n);
    round_to(rate * growth / (growth - 1.0), 6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.0 / 0.95, 8), 1.05263158);
        assert_eq!(round_to(0.1234565, 3), 0.123);
        assert_eq!(round_to(-2.5, 0), -3.0);
    }

    #[test]
    fn test_capital_recovery_factor_matches_reference_values() {
        // 7.5 % over 25 and 15 years
        assert_eq!(capital_recovery_factor(0.075, 25), 0.089711);
        assert_eq!(capital_recovery_factor(0.075, 15), 0.113287);
    }

    #[test]
    fn test_capital_recovery_factor_limits() {
        assert_eq!(capital_recovery_factor(0.0, 20), 0.05);
        // one year annuity repays principal plus one year of interest
        assert_eq!(capital_recovery_factor(0.1, 1), 1.1);
        // longer lives always recover less per year
        assert!(capital_recovery_factor(0.075, 30) < capital_recovery_factor(0.075, 25));
    }
}
