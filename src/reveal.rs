/// Typewriter reveal of a completed model reply.
///
/// Holds the full text and exposes a growing prefix, advanced a few
/// characters per animation tick. Advancing always lands on a char
/// boundary, so `visible()` is safe to slice for any input.
#[derive(Debug)]
pub struct Reveal {
    full: String,
    shown: usize,
    char_count: usize,
}

impl Reveal {
    pub fn new(full: String) -> Self {
        let char_count = full.chars().count();
        Self {
            full,
            shown: 0,
            char_count,
        }
    }

    /// Reveal up to `n` more characters.
    pub fn advance(&mut self, n: usize) {
        self.shown = (self.shown + n).min(self.char_count);
    }

    /// The currently revealed prefix.
    pub fn visible(&self) -> &str {
        match self.full.char_indices().nth(self.shown) {
            Some((byte_idx, _)) => &self.full[..byte_idx],
            None => &self.full,
        }
    }

    pub fn is_done(&self) -> bool {
        self.shown >= self.char_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_grows_monotonically() {
        let mut reveal = Reveal::new("Hi there!".to_string());
        let mut last_len = 0;
        while !reveal.is_done() {
            reveal.advance(2);
            let len = reveal.visible().chars().count();
            assert!(len > last_len, "prefix must strictly grow until done");
            last_len = len;
        }
        assert_eq!(reveal.visible(), "Hi there!");
    }

    #[test]
    fn test_reveal_visible_is_prefix() {
        let text = "The quick brown fox";
        let mut reveal = Reveal::new(text.to_string());
        for _ in 0..10 {
            reveal.advance(3);
            assert!(text.starts_with(reveal.visible()));
        }
    }

    #[test]
    fn test_reveal_utf8_boundaries() {
        let mut reveal = Reveal::new("héllo wörld 👋 done".to_string());
        while !reveal.is_done() {
            reveal.advance(1);
            // Slicing would have panicked on a bad boundary already;
            // also confirm the prefix is valid char-wise.
            let _ = reveal.visible().chars().count();
        }
        assert_eq!(reveal.visible(), "héllo wörld 👋 done");
    }

    #[test]
    fn test_reveal_advance_past_end_is_clamped() {
        let mut reveal = Reveal::new("abc".to_string());
        reveal.advance(100);
        assert!(reveal.is_done());
        assert_eq!(reveal.visible(), "abc");
        reveal.advance(1);
        assert_eq!(reveal.visible(), "abc");
    }

    #[test]
    fn test_reveal_empty_string_is_done_immediately() {
        let reveal = Reveal::new(String::new());
        assert!(reveal.is_done());
        assert_eq!(reveal.visible(), "");
    }
}
