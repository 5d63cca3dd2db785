use crate::error::{AppError, Result};

/// Largest amount a single payment, fee, price or expense may carry ($10,000,000).
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000;

/// Parses a form amount such as "2000", "2,000" or "2000.50" into cents.
///
/// Only plain decimals with at most two fractional digits are accepted.
pub fn parse_amount_cents(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    let cleaned: String = trimmed
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    if cleaned.is_empty() {
        return Err(AppError::Validation("Amount is required".to_string()));
    }

    let invalid = || AppError::Validation(format!("Invalid amount: {}", trimmed));
    let (whole, fraction) = match cleaned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (cleaned.as_str(), ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty())
        || !all_digits(whole)
        || !all_digits(fraction)
        || fraction.len() > 2
    {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| too_large())?
    };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };

    let cents = whole
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or_else(too_large)?;
    check_amount(cents, "Amount")?;
    Ok(cents)
}

/// Rejects negative amounts and amounts above [`MAX_AMOUNT_CENTS`].
pub fn check_amount(cents: i64, what: &str) -> Result<()> {
    if cents < 0 {
        return Err(AppError::Validation(format!("{} cannot be negative", what)));
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(AppError::Validation(format!(
            "{} cannot exceed {}",
            what,
            format_cents(MAX_AMOUNT_CENTS)
        )));
    }
    Ok(())
}

/// `a * b` in cents, or a Validation error when it does not fit.
pub fn checked_product(a: i64, b: i64) -> Result<i64> {
    a.checked_mul(b).ok_or_else(too_large)
}

/// Sum of cent amounts, or a Validation error when it does not fit.
pub fn checked_total<I>(amounts: I) -> Result<i64>
where
    I: IntoIterator<Item = i64>,
{
    amounts
        .into_iter()
        .try_fold(0i64, |total, amount| total.checked_add(amount))
        .ok_or_else(too_large)
}

fn too_large() -> AppError {
    AppError::Validation("Amount is too large".to_string())
}

/// "$2,000" for whole amounts, "$2,000.50" otherwise.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if fraction == 0 {
        format!("{}${}", sign, grouped)
    } else {
        format!("{}${}.{:02}", sign, grouped, fraction)
    }
}

/// Plain decimal for pre-filling form inputs, e.g. "2000" or "800.50".
pub fn cents_to_input(cents: i64) -> String {
    if cents % 100 == 0 {
        (cents / 100).to_string()
    } else {
        format!("{}.{:02}", cents / 100, (cents % 100).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_cents() {
        assert_eq!(parse_amount_cents("2000").unwrap(), 200_000);
        assert_eq!(parse_amount_cents(" $2,000.50 ").unwrap(), 200_050);
        assert_eq!(parse_amount_cents("0.1").unwrap(), 10);
        assert!(parse_amount_cents("").is_err());
        assert!(parse_amount_cents("-5").is_err());
        assert!(parse_amount_cents("abc").is_err());
        assert_eq!(parse_amount_cents(".5").unwrap(), 50);
        assert_eq!(parse_amount_cents("12.").unwrap(), 1200);
        assert!(parse_amount_cents(".").is_err());
        assert!(parse_amount_cents("1.234").is_err());
        assert!(parse_amount_cents("1.2.3").is_err());
        assert!(parse_amount_cents("+5").is_err());
    }

    #[test]
    fn test_parse_amount_rejects_exponents_and_huge_values() {
        assert!(matches!(parse_amount_cents("1e17"), Err(AppError::Validation(_))));
        assert!(matches!(parse_amount_cents("inf"), Err(AppError::Validation(_))));
        assert!(matches!(parse_amount_cents("NaN"), Err(AppError::Validation(_))));
        assert!(matches!(
            parse_amount_cents("99999999999999999999999"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(parse_amount_cents("10000000.01"), Err(AppError::Validation(_))));
        assert_eq!(parse_amount_cents("10,000,000").unwrap(), MAX_AMOUNT_CENTS);
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(checked_product(200_000, 6).unwrap(), 1_200_000);
        assert!(matches!(checked_product(i64::MAX, 2), Err(AppError::Validation(_))));
        assert_eq!(checked_total([1, 2, 3]).unwrap(), 6);
        assert!(matches!(checked_total([i64::MAX, 1]), Err(AppError::Validation(_))));
        assert_eq!(checked_total(std::iter::empty()).unwrap(), 0);
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(200_000), "$2,000");
        assert_eq!(format_cents(1_200_000), "$12,000");
        assert_eq!(format_cents(80_050), "$800.50");
        assert_eq!(format_cents(0), "$0");
        assert_eq!(format_cents(-1500), "-$15");
    }

    #[test]
    fn test_cents_to_input() {
        assert_eq!(cents_to_input(200_000), "2000");
        assert_eq!(cents_to_input(80_050), "800.50");
    }
}
