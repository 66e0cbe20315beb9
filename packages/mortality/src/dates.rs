//! Date parsing for the mortality and rally tables.

use chrono::NaiveDate;

use crate::MortalityError;

/// Parses a JHU column header such as `"8/17/20"` (`M/D/YY`, year in the
/// 2000s).
///
/// # Errors
///
/// Returns [`MortalityError::MalformedDate`] unless the header is three
/// `/`-separated numbers with a one- or two-digit year forming a real date.
pub fn parse_header_date(header: &str) -> Result<NaiveDate, MortalityError> {
    let malformed = || MortalityError::MalformedDate {
        value: header.to_string(),
    };

    let mut parts = header.trim().split('/');
    let (Some(month), Some(day), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    if year.is_empty() || year.len() > 2 {
        return Err(malformed());
    }

    let month: u32 = parse_digits(month).ok_or_else(malformed)?;
    let day: u32 = parse_digits(day).ok_or_else(malformed)?;
    let year: i32 = parse_digits(year).ok_or_else(malformed)?;

    NaiveDate::from_ymd_opt(2000 + year, month, day).ok_or_else(malformed)
}

/// Parses an ISO 8601 calendar date (`YYYY-MM-DD`).
///
/// # Errors
///
/// Returns [`MortalityError::MalformedDate`] if `s` is not a valid date.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, MortalityError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| MortalityError::MalformedDate {
        value: s.to_string(),
    })
}

fn parse_digits<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_dates() {
        assert_eq!(
            parse_header_date("8/17/20").unwrap(),
            NaiveDate::from_ymd_opt(2020, 8, 17).unwrap()
        );
        assert_eq!(
            parse_header_date("1/22/20").unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 22).unwrap()
        );
        assert_eq!(
            parse_header_date("12/31/21").unwrap(),
            NaiveDate::from_ymd_opt(2021, 12, 31).unwrap()
        );
    }

    #[test]
    fn rejects_identifying_headers() {
        for header in ["Admin2", "Combined_Key", "Long_", ""] {
            assert!(matches!(
                parse_header_date(header),
                Err(MortalityError::MalformedDate { .. })
            ));
        }
    }

    #[test]
    fn rejects_bad_header_shapes() {
        assert!(parse_header_date("8/17/2020").is_err());
        assert!(parse_header_date("8/17").is_err());
        assert!(parse_header_date("8/17/20/1").is_err());
        assert!(parse_header_date("13/1/20").is_err());
        assert!(parse_header_date("2/30/20").is_err());
        assert!(parse_header_date("+8/17/20").is_err());
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(
            parse_iso_date(" 2020-08-17").unwrap(),
            NaiveDate::from_ymd_opt(2020, 8, 17).unwrap()
        );
        assert!(parse_iso_date("08/17/2020").is_err());
    }
}
