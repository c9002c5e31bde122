use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Result, VaultError};

const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!#$%&()*+-./:;<=>?@[]^_{}~";

pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Random password with at least one lowercase letter, uppercase letter and
/// digit. Look-alike characters (0/O, 1/l/I) are left out.
pub fn generate_password(length: usize) -> Result<String> {
    if length < MIN_PASSWORD_LENGTH {
        return Err(VaultError::PasswordLength(length));
    }
    let mut rng = rand::rngs::OsRng;
    let all: Vec<u8> = [LOWER, UPPER, DIGITS, SYMBOLS].concat();

    let mut chars: Vec<u8> = [LOWER, UPPER, DIGITS]
        .iter()
        .map(|set| set[rng.gen_range(0..set.len())])
        .collect();
    while chars.len() < length {
        chars.push(all[rng.gen_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);
    Ok(chars.into_iter().map(char::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_passwords_have_requested_length_and_classes() {
        for length in [4, 12, 40] {
            let pw = generate_password(length).unwrap();
            assert_eq!(pw.chars().count(), length);
            assert!(pw.chars().any(|c| c.is_ascii_lowercase()));
            assert!(pw.chars().any(|c| c.is_ascii_uppercase()));
            assert!(pw.chars().any(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn short_lengths_are_rejected() {
        assert!(generate_password(3).is_err());
    }

    #[test]
    fn generated_passwords_never_contain_the_field_delimiter() {
        let pw = generate_password(64).unwrap();
        assert!(!pw.contains(crate::record::FIELD_DELIM));
    }
}
