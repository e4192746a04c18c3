//! Price arithmetic and display helpers for tours and bookings.

use crate::errors::AppError;

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tax {
    pub tax: f64,
    pub total: Option<f64>,
}

/// Round to `decimals` places, half away from zero.
#[must_use]
pub fn round_to_decimal(value: f64, decimals: u32) -> f64 {
    let multiplier = 10_f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    (value * multiplier).round() / multiplier
}

#[must_use]
pub fn calculate_total_price(base_price: f64, quantity: u32) -> f64 {
    round_to_decimal(base_price * f64::from(quantity), 2)
}

/// # Errors
/// Returns a validation error when the percentage is outside `0..=100`.
pub fn calculate_discounted_price(original_price: f64, discount_percentage: f64) -> Result<f64, AppError> {
    if !(0.0..=100.0).contains(&discount_percentage) {
        return Err(AppError::field(
            "Invalid discount",
            "discountPercentage",
            "Discount percentage must be between 0 and 100",
        ));
    }
    let discount = original_price * (discount_percentage / 100.0);
    Ok(round_to_decimal(original_price - discount, 2))
}

#[must_use]
pub fn calculate_tax(amount: f64, tax_rate: f64, include_total: bool) -> Tax {
    let tax = round_to_decimal(amount * (tax_rate / 100.0), 2);
    Tax {
        tax,
        total: include_total.then(|| round_to_decimal(amount + tax, 2)),
    }
}

#[must_use]
pub fn format_tax_rate(tax_rate: f64) -> String {
    format!("{tax_rate:.2}%")
}

fn currency_prefix(currency: &str) -> String {
    match currency.to_ascii_uppercase().as_str() {
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        other => format!("{other} "),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format an amount with a currency symbol, thousands separators and two decimals.
#[must_use]
pub fn format_price(amount: f64, currency: &str) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!(
        "{sign}{}{}.{fraction}",
        currency_prefix(currency),
        group_thousands(whole)
    )
}

#[must_use]
pub fn format_price_range(min_price: f64, max_price: f64, currency: &str) -> String {
    format!(
        "{} - {}",
        format_price(min_price, currency),
        format_price(max_price, currency)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_round_to_cents() {
        assert!((calculate_total_price(19.99, 3) - 59.97).abs() < f64::EPSILON);
        assert!((round_to_decimal(2.345_678, 2) - 2.35).abs() < 1e-9);
    }

    #[test]
    fn discount_bounds() {
        assert!(matches!(calculate_discounted_price(100.0, 25.0), Ok(v) if (v - 75.0).abs() < f64::EPSILON));
        assert!(calculate_discounted_price(100.0, 101.0).is_err());
        assert!(calculate_discounted_price(100.0, -1.0).is_err());
    }

    #[test]
    fn tax_with_and_without_total() {
        let tax = calculate_tax(200.0, 7.5, true);
        assert!((tax.tax - 15.0).abs() < f64::EPSILON);
        assert_eq!(tax.total, Some(215.0));
        assert_eq!(calculate_tax(200.0, 7.5, false).total, None);
        assert_eq!(format_tax_rate(7.5), "7.50%");
    }

    #[test]
    fn price_formatting() {
        assert_eq!(format_price(1234.5, "USD"), "$1,234.50");
        assert_eq!(format_price(0.0, DEFAULT_CURRENCY), "$0.00");
        assert_eq!(format_price(-12.0, "eur"), "-€12.00");
        assert_eq!(format_price(1_000_000.0, "CHF"), "CHF 1,000,000.00");
        assert_eq!(format_price_range(10.0, 99.99, "GBP"), "£10.00 - £99.99");
    }
}
