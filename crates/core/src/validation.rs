use snafu::ensure;

use crate::error::{
    MissingCountryCodeSnafu, OtpLengthSnafu, OtpNotNumericSnafu, PhoneNotNumericSnafu,
    PhoneTooLongSnafu, PhoneTooShortSnafu, TitleTooLongSnafu, TitleTooShortSnafu,
    ValidationError,
};

pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_DIGITS: usize = 15;
pub const OTP_DIGITS: usize = 6;
pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 50;

fn all_ascii_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

pub fn validate_country_code(country_code: &str) -> Result<(), ValidationError> {
    ensure!(!country_code.trim().is_empty(), MissingCountryCodeSnafu);
    Ok(())
}

/// Checks run in the same order the form reports them: length first, then content.
pub fn validate_phone_number(phone_number: &str) -> Result<(), ValidationError> {
    let length = phone_number.chars().count();
    ensure!(length >= PHONE_MIN_DIGITS, PhoneTooShortSnafu);
    ensure!(length <= PHONE_MAX_DIGITS, PhoneTooLongSnafu);
    ensure!(all_ascii_digits(phone_number), PhoneNotNumericSnafu);
    Ok(())
}

pub fn validate_otp(otp: &str) -> Result<(), ValidationError> {
    ensure!(otp.chars().count() == OTP_DIGITS, OtpLengthSnafu);
    ensure!(all_ascii_digits(otp), OtpNotNumericSnafu);
    Ok(())
}

/// Returns the trimmed title on success.
pub fn validate_title(title: &str) -> Result<&str, ValidationError> {
    let title = title.trim();
    let length = title.chars().count();
    ensure!(length >= TITLE_MIN_CHARS, TitleTooShortSnafu);
    ensure!(length <= TITLE_MAX_CHARS, TitleTooLongSnafu);
    Ok(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers_need_ten_to_fifteen_digits() {
        assert_eq!(validate_phone_number("9876543210"), Ok(()));
        assert_eq!(validate_phone_number("123456789012345"), Ok(()));
        assert_eq!(
            validate_phone_number("987654321"),
            Err(ValidationError::PhoneTooShort)
        );
        assert_eq!(
            validate_phone_number("1234567890123456"),
            Err(ValidationError::PhoneTooLong)
        );
        assert_eq!(
            validate_phone_number("98765-43210"),
            Err(ValidationError::PhoneNotNumeric)
        );
        assert_eq!(
            validate_phone_number("١٢٣٤٥٦٧٨٩٠"),
            Err(ValidationError::PhoneNotNumeric)
        );
    }

    #[test]
    fn country_code_must_be_present() {
        assert_eq!(validate_country_code("+1"), Ok(()));
        assert_eq!(
            validate_country_code("  "),
            Err(ValidationError::MissingCountryCode)
        );
    }

    #[test]
    fn otp_is_exactly_six_digits() {
        assert_eq!(validate_otp("123456"), Ok(()));
        assert_eq!(validate_otp("12345"), Err(ValidationError::OtpLength));
        assert_eq!(validate_otp("1234567"), Err(ValidationError::OtpLength));
        assert_eq!(validate_otp("12a456"), Err(ValidationError::OtpNotNumeric));
    }

    #[test]
    fn titles_are_trimmed_then_bounded() {
        assert_eq!(validate_title("  Trip Planning "), Ok("Trip Planning"));
        assert_eq!(validate_title(" ab "), Err(ValidationError::TitleTooShort));
        assert_eq!(
            validate_title(&"x".repeat(51)),
            Err(ValidationError::TitleTooLong)
        );
        assert_eq!(validate_title(&"é".repeat(50)), Ok("é".repeat(50).as_str()));
        assert_eq!(
            ValidationError::TitleTooShort.to_string(),
            "Title must be at least 3 characters"
        );
    }
}
