//! `secrets` command: random values to paste into `.env`.

use super::output::Output;
use rand::Rng;

const SECRET_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";
const PASSWORD_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Shortest secret the command will print.
pub const MIN_LENGTH: usize = 16;

/// `length` characters drawn uniformly from `alphabet`.
pub fn generate(length: usize, alphabet: &[u8]) -> String {
    if alphabet.is_empty() {
        return String::new();
    }
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
        .collect()
}

/// Variable names and fresh values for the secrets a deployment typically needs.
pub fn env_vars(length: usize) -> Vec<(&'static str, String)> {
    let length = length.max(MIN_LENGTH);
    vec![
        ("SECRET_KEY", generate(length, SECRET_ALPHABET)),
        ("TURSO_AUTH_TOKEN", generate(length, PASSWORD_ALPHABET)),
    ]
}

/// Print the secrets with a warning
pub fn run(length: usize, output: &Output) {
    output.header("Secure secrets for the Knowledge Assistant");
    output.newline();
    for (key, value) in env_vars(length) {
        output.env_var(key, &value);
    }
    output.newline();
    output.warning("Add these to your .env file and keep them out of version control");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_uses_alphabet() {
        let secret = generate(64, PASSWORD_ALPHABET);
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_empty_alphabet() {
        assert_eq!(generate(10, b""), "");
    }

    #[test]
    fn test_env_vars_enforce_minimum_length() {
        let vars = env_vars(4);
        assert_eq!(vars[0].0, "SECRET_KEY");
        assert_eq!(vars[1].0, "TURSO_AUTH_TOKEN");
        for (_, value) in vars {
            assert_eq!(value.chars().count(), MIN_LENGTH);
        }
    }
}
