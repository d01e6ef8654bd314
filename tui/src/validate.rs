use displaydoc::Display;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Display)]
pub enum ValidationError {
    /// {0} is required
    Required(&'static str),
    /// {0} must only contain digits
    NotNumeric(&'static str),
    /// {0} must be {1} digits
    Length(&'static str, usize),
    /// {0} must be {1} to {2} digits
    LengthBetween(&'static str, usize, usize),
    /// {0} is not a valid email address
    Email(&'static str),
    /// {0} is not a valid card number
    CardNumber(&'static str),
    /// {0} must be between 01 and 12
    Month(&'static str),
    /// phone is required for international orders
    PhoneRequired,
}

pub type Validator = fn(&'static str, &str) -> Result<(), ValidationError>;

pub fn required(label: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(label));
    }
    Ok(())
}

pub fn numeric(label: &'static str, value: &str) -> Result<(), ValidationError> {
    if !value.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::NotNumeric(label));
    }
    Ok(())
}

pub fn digits<const N: usize>(label: &'static str, value: &str) -> Result<(), ValidationError> {
    numeric(label, value)?;
    if value.len() != N {
        return Err(ValidationError::Length(label, N));
    }
    Ok(())
}

pub fn digits_between<const MIN: usize, const MAX: usize>(
    label: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    numeric(label, value)?;
    if !(MIN..=MAX).contains(&value.len()) {
        return Err(ValidationError::LengthBetween(label, MIN, MAX));
    }
    Ok(())
}

pub fn month(label: &'static str, value: &str) -> Result<(), ValidationError> {
    digits::<2>(label, value)?;
    match value.parse::<u32>() {
        Ok(1..=12) => Ok(()),
        _ => Err(ValidationError::Month(label)),
    }
}

pub fn email(label: &'static str, value: &str) -> Result<(), ValidationError> {
    let valid = value.split_once('@').is_some_and(|(user, domain)| {
        !user.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !value.contains(char::is_whitespace)
    });
    if !valid {
        return Err(ValidationError::Email(label));
    }
    Ok(())
}

/// Card numbers: 12 to 19 digits, spaces allowed, Luhn checksum.
pub fn card_number(label: &'static str, value: &str) -> Result<(), ValidationError> {
    let number = clean_card_number(value);
    if !number.chars().all(|ch| ch.is_ascii_digit()) || !(12..=19).contains(&number.len()) {
        return Err(ValidationError::CardNumber(label));
    }
    let sum: u32 = number
        .chars()
        .rev()
        .filter_map(|ch| ch.to_digit(10))
        .enumerate()
        .map(|(index, digit)| {
            if index % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    if sum % 10 != 0 {
        return Err(ValidationError::CardNumber(label));
    }
    Ok(())
}

pub fn clean_card_number(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-')
        .collect()
}
