//! Parsers and clap validators shared by the command-line tools.

use num::Complex;
use std::str::FromStr;

/// Given a string and a separator, returns the two values
/// separated by the separator.
pub fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// A specific implementation of parse_pair using a comma and expecting
/// floating point numbers.
pub fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

/// An image size written `WIDTHxHEIGHT`, each side between 1 and
/// 65535 pixels.
pub fn parse_size(s: &str) -> Option<(usize, usize)> {
    match parse_pair::<u16>(s, 'x') {
        Some((w, h)) if w > 0 && h > 0 => Some((w as usize, h as usize)),
        _ => None,
    }
}

/// Clap validator for anything parse_pair accepts.
pub fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

/// Clap validator for image sizes.
pub fn validate_size(s: &str) -> Result<(), String> {
    match parse_size(s) {
        Some(_) => Ok(()),
        None => Err(format!("Could not parse image size '{}': expected e.g. 1920x1080", s)),
    }
}

/// Clap validator for a number within an inclusive range.
pub fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}
