// Random string generation for auth keys and reset tokens

use rand::Rng;

/// URL-safe alphabet used for generated keys
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Length of generated auth keys and reset token prefixes
pub const DEFAULT_LENGTH: usize = 32;

/// Generates a random string of `length` characters from `[A-Za-z0-9_-]`
///
/// # Example
/// ```
/// use token_api::auth::random::generate_random_string;
///
/// let key = generate_random_string(32);
/// assert_eq!(key.len(), 32);
/// ```
pub fn generate_random_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_length() {
        assert_eq!(generate_random_string(0).len(), 0);
        assert_eq!(generate_random_string(DEFAULT_LENGTH).len(), DEFAULT_LENGTH);
        assert_eq!(generate_random_string(100).len(), 100);
    }

    #[test]
    fn uses_url_safe_alphabet() {
        let value = generate_random_string(256);
        assert!(value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn outputs_differ() {
        assert_ne!(
            generate_random_string(DEFAULT_LENGTH),
            generate_random_string(DEFAULT_LENGTH)
        );
    }
}
