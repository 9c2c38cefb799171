use crate::generator::CodeGenerator;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Replays a fixed sequence of codes, then keeps returning the last
/// one. Lets tests drive the reservation loop into collisions and
/// exhaustion deterministically.
#[derive(Debug)]
pub struct ScriptedGenerator {
    codes: Vec<String>,
    next: AtomicUsize,
}

impl ScriptedGenerator {
    /// Creates a generator replaying `codes` in order.
    ///
    /// # Panics
    ///
    /// Panics if `codes` is empty.
    pub fn new<I, T>(codes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let codes: Vec<String> = codes.into_iter().map(Into::into).collect();
        assert!(!codes.is_empty(), "scripted generator needs at least one code");
        Self {
            codes,
            next: AtomicUsize::new(0),
        }
    }
}

impl CodeGenerator for ScriptedGenerator {
    fn generate(&self) -> String {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        self.codes[index.min(self.codes.len() - 1)].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_then_repeats_last() {
        let generator = ScriptedGenerator::new(["aaaaaa", "bbbbbb"]);

        assert_eq!(generator.generate(), "aaaaaa");
        assert_eq!(generator.generate(), "bbbbbb");
        assert_eq!(generator.generate(), "bbbbbb");
    }
}
