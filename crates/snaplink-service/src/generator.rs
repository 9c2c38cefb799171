pub mod scripted;

use std::iter;

/// Length of every generated short code.
pub const CODE_LENGTH: usize = 6;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Produces short-code candidates.
///
/// Implementations are pure and stateless with respect to storage:
/// candidates are not guaranteed unique, uniqueness is enforced by the
/// caller's reservation loop.
pub trait CodeGenerator: Send + Sync + 'static {
    /// Generates one candidate code.
    fn generate(&self) -> String;
}

/// Draws [`CODE_LENGTH`] characters uniformly from `[a-zA-Z]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        iter::repeat_with(|| ALPHABET[rand::random_range(0..ALPHABET.len())] as char)
            .take(CODE_LENGTH)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_fixed_length_ascii_alphabetic() {
        let generator = RandomCodeGenerator;

        for _ in 0..1000 {
            let code = generator.generate();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn consecutive_codes_vary() {
        let generator = RandomCodeGenerator;

        // 52^6 candidates; 100 draws repeating would mean a broken RNG.
        let codes: std::collections::HashSet<String> =
            (0..100).map(|_| generator.generate()).collect();
        assert!(codes.len() > 1);
    }
}
