//! Token bounding boxes and line wrapping

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use super::font::TextMeasure;

/// 1D bounding box for a token. All positions are relative to the token start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBox {
    /// Total width of the token
    pub width: f32,
    /// Midpoint of the first grapheme
    pub first_char: f32,
    /// Midpoint of the token
    pub mid: f32,
    /// Midpoint of the last grapheme
    pub last_char: f32,
}

impl TokenBox {
    /// Box for a token known only by its width: a single glyph position
    /// at the middle
    pub fn from_width(width: f32) -> Self {
        let mid = width / 2.0;
        Self {
            width,
            first_char: mid,
            mid,
            last_char: mid,
        }
    }

    /// True when the first and last glyph midpoints differ by more than 5%
    pub fn is_wide(&self) -> bool {
        let tolerance = 0.05 * self.first_char.abs().max(self.last_char.abs());
        (self.first_char - self.last_char).abs() > tolerance
    }
}

/// Measure each token and locate its first and last grapheme
pub fn token_boxes<S: AsRef<str>>(tokens: &[S], measure: &TextMeasure) -> Vec<TokenBox> {
    tokens
        .iter()
        .map(|token| {
            let token = token.as_ref();
            let width = measure.text_width(token);
            let mut graphemes = token.graphemes(true);
            let first = graphemes.next().map_or(0.0, |g| measure.text_width(g));
            let last = graphemes.next_back().map_or(first, |g| measure.text_width(g));

            TokenBox {
                width,
                first_char: first / 2.0,
                mid: width / 2.0,
                last_char: width - last / 2.0,
            }
        })
        .collect()
}

/// Greedily split tokens into lines no wider than `max_width`
///
/// Returns index ranges into `boxes`. A token that does not fit starts a new
/// line; a token wider than `max_width` gets a line of its own. Empty lines
/// are never produced.
pub fn wrap_lines(boxes: &[TokenBox], max_width: f32) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut current_width = 0.0;

    for (i, token) in boxes.iter().enumerate() {
        if current_width + token.width > max_width && line_start < i {
            lines.push(line_start..i);
            line_start = i;
            current_width = token.width;
        } else {
            current_width += token.width;
        }
    }

    if line_start < boxes.len() {
        lines.push(line_start..boxes.len());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono() -> TextMeasure {
        TextMeasure::monospace(10.0)
    }

    #[test]
    fn test_token_box_single_char() {
        let boxes = token_boxes(&["a"], &mono());
        assert_eq!(
            boxes[0],
            TokenBox {
                width: 10.0,
                first_char: 5.0,
                mid: 5.0,
                last_char: 5.0
            }
        );
        assert!(!boxes[0].is_wide());
        assert_eq!(boxes[0], TokenBox::from_width(10.0));
    }

    #[test]
    fn test_token_box_word() {
        let boxes = token_boxes(&[" word"], &mono());
        let b = boxes[0];
        assert_eq!(b.width, 50.0);
        assert_eq!(b.first_char, 5.0);
        assert_eq!(b.mid, 25.0);
        assert_eq!(b.last_char, 45.0);
        assert!(b.is_wide());
    }

    #[test]
    fn test_token_box_uses_graphemes() {
        // "e" + combining acute is a single grapheme of width 1
        let boxes = token_boxes(&["e\u{301}x"], &mono());
        assert_eq!(boxes[0].width, 20.0);
        assert_eq!(boxes[0].first_char, 5.0);
        assert_eq!(boxes[0].last_char, 15.0);
    }

    #[test]
    fn test_token_box_cjk() {
        let boxes = token_boxes(&["你好"], &mono());
        assert_eq!(boxes[0].width, 40.0);
        assert_eq!(boxes[0].first_char, 10.0);
        assert_eq!(boxes[0].last_char, 30.0);
    }

    #[test]
    fn test_token_box_empty() {
        let boxes = token_boxes(&[""], &mono());
        assert_eq!(boxes[0].width, 0.0);
    }

    #[test]
    fn test_wrap_fits_one_line() {
        let boxes = token_boxes(&["ab", "cd", "ef"], &mono());
        assert_eq!(wrap_lines(&boxes, 60.0), vec![0..3]);
    }

    #[test]
    fn test_wrap_splits_lines() {
        let boxes = token_boxes(&["ab", "cd", "ef", "gh"], &mono());
        assert_eq!(wrap_lines(&boxes, 40.0), vec![0..2, 2..4]);
        assert_eq!(wrap_lines(&boxes, 50.0), vec![0..2, 2..4]);
    }

    #[test]
    fn test_wrap_oversize_token_gets_own_line() {
        let boxes = token_boxes(&["a", "abcdefghij", "b"], &mono());
        assert_eq!(wrap_lines(&boxes, 30.0), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_wrap_oversize_first_token() {
        let boxes = token_boxes(&["abcdefghij", "b"], &mono());
        assert_eq!(wrap_lines(&boxes, 30.0), vec![0..1, 1..2]);
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap_lines(&[], 30.0).is_empty());
    }

    #[test]
    fn test_wrap_covers_all_tokens() {
        let tokens: Vec<String> = (0..37).map(|i| "x".repeat(i % 7 + 1)).collect();
        let boxes = token_boxes(&tokens, &mono());
        let lines = wrap_lines(&boxes, 100.0);

        let mut expected_start = 0;
        for line in &lines {
            assert_eq!(line.start, expected_start);
            assert!(line.end > line.start);
            expected_start = line.end;
        }
        assert_eq!(expected_start, tokens.len());
    }
}
