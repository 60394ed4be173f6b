//! Word-by-word reveal of a generated passage.
//!
//! Purely a display effect: the passage is complete before the first frame.

use std::time::Duration;

/// Trailing cursor shown on every frame except the final one.
pub const CURSOR: &str = "▌";

/// Yields `words + 1` frames. Frame `i < words` holds the first `i + 1`
/// words (each followed by a space) and the cursor; the last frame holds the
/// whole text without it.
#[derive(Debug, Clone)]
pub struct Typewriter {
    words: Vec<String>,
    next: usize,
    acc: String,
}

impl Typewriter {
    pub fn new(passage: &str) -> Self {
        Self {
            words: passage.split_whitespace().map(str::to_string).collect(),
            next: 0,
            acc: String::new(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.words.len() + 1
    }

    /// The settled text every frame converges to.
    pub fn final_text(&self) -> String {
        self.words.iter().map(|w| format!("{w} ")).collect()
    }

    pub fn is_finished(&self) -> bool {
        self.next > self.words.len()
    }
}

impl Iterator for Typewriter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let total = self.words.len();
        if self.next > total {
            return None;
        }
        let frame = if self.next < total {
            self.acc.push_str(&self.words[self.next]);
            self.acc.push(' ');
            format!("{}{CURSOR}", self.acc)
        } else {
            self.acc.clone()
        };
        self.next += 1;
        Some(frame)
    }
}

/// Drive `on_frame` through every frame, pausing `delay` before each word.
/// Returns the settled text.
pub async fn animate<F>(passage: &str, delay: Duration, mut on_frame: F) -> String
where
    F: FnMut(&str),
{
    let writer = Typewriter::new(passage);
    let words = writer.frame_count() - 1;
    let mut last = String::new();
    for (i, frame) in writer.enumerate() {
        if i < words && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        on_frame(&frame);
        last = frame;
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_grow_with_cursor() {
        let frames: Vec<String> = Typewriter::new("Watch Alien tonight").collect();
        assert_eq!(
            frames,
            vec![
                "Watch ▌".to_string(),
                "Watch Alien ▌".to_string(),
                "Watch Alien tonight ▌".to_string(),
                "Watch Alien tonight ".to_string(),
            ]
        );
    }

    #[test]
    fn test_final_frame_matches_final_text() {
        let writer = Typewriter::new("one  two\nthree");
        let expected = writer.final_text();
        assert_eq!(writer.frame_count(), 4);
        assert_eq!(writer.last().unwrap(), expected);
        assert_eq!(expected, "one two three ");
    }

    #[test]
    fn test_empty_passage_single_frame() {
        let frames: Vec<String> = Typewriter::new("   ").collect();
        assert_eq!(frames, vec![String::new()]);
    }

    #[test]
    fn test_finished_after_all_frames() {
        let mut writer = Typewriter::new("a b");
        assert!(!writer.is_finished());
        writer.by_ref().for_each(drop);
        assert!(writer.is_finished());
        assert!(writer.next().is_none());
    }

    #[tokio::test]
    async fn test_animate_reports_every_frame() {
        let mut seen = Vec::new();
        let settled = animate("Heat is great", Duration::ZERO, |f| seen.push(f.to_string())).await;
        assert_eq!(seen.len(), 4);
        assert!(seen[..3].iter().all(|f| f.ends_with(CURSOR)));
        assert_eq!(settled, "Heat is great ");
    }
}
