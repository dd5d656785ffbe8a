//! Text anchor resolution
//!
//! Segment offsets count characters of the document text, not UTF-8 bytes.
//! [`DocumentText`] precomputes the character boundaries once so resolving
//! many anchors over the same document stays linear.

use docflow_core::TextSegment;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpanError {
    #[error("Segment {start}..{end} out of range for text of {len} characters")]
    OutOfRange { start: u64, end: u64, len: usize },

    #[error("Segment end {end} precedes start {start}")]
    Inverted { start: u64, end: u64 },
}

/// Document text indexed by character position.
#[derive(Debug, Clone)]
pub struct DocumentText<'a> {
    text: &'a str,
    /// Byte offset of every character, plus `text.len()` as the final entry.
    boundaries: Vec<usize>,
}

impl<'a> DocumentText<'a> {
    pub fn new(text: &'a str) -> Self {
        let boundaries = text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(text.len()))
            .collect();
        Self { text, boundaries }
    }

    /// Number of characters in the text.
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    fn byte_offset(&self, index: u64) -> Option<usize> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.boundaries.get(i).copied())
    }

    /// Raw slice for one segment, no normalisation.
    pub fn slice(&self, segment: &TextSegment) -> Result<&'a str, SpanError> {
        let (start, end) = (segment.start_index, segment.end_index);
        if end < start {
            return Err(SpanError::Inverted { start, end });
        }
        match (self.byte_offset(start), self.byte_offset(end)) {
            (Some(from), Some(to)) => Ok(&self.text[from..to]),
            _ => Err(SpanError::OutOfRange {
                start,
                end,
                len: self.char_len(),
            }),
        }
    }

    /// Concatenate the segments in order, trim the result and turn every
    /// newline into a single space.
    pub fn resolve(&self, segments: &[TextSegment]) -> Result<String, SpanError> {
        let mut joined = String::new();
        for segment in segments {
            joined.push_str(self.slice(segment)?);
        }
        Ok(joined.trim().replace('\n', " "))
    }
}

/// One-shot form of [`DocumentText::resolve`].
pub fn resolve(text: &str, segments: &[TextSegment]) -> Result<String, SpanError> {
    DocumentText::new(text).resolve(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: u64, end: u64) -> TextSegment {
        TextSegment::new(start, end)
    }

    #[test]
    fn concatenates_segments_in_order() {
        let text = "Monto: 100 USD\nDesc: agua";
        assert_eq!(resolve(text, &[seg(7, 10), seg(10, 14)]).unwrap(), "100 USD");
        assert_eq!(resolve(text, &[seg(21, 25), seg(6, 10)]).unwrap(), "agua 100");
    }

    #[test]
    fn trims_and_replaces_newlines() {
        let text = "  Calle 1\nPiso 2\n";
        assert_eq!(resolve(text, &[seg(0, 17)]).unwrap(), "Calle 1 Piso 2");
    }

    #[test]
    fn whole_text_matches_normalised_text() {
        let text = "\n Póliza N° 123\nVigencia: 2024\n\n";
        let whole = seg(0, text.chars().count() as u64);
        assert_eq!(
            resolve(text, &[whole]).unwrap(),
            text.trim().replace('\n', " ")
        );
    }

    #[test]
    fn empty_segment_list_is_empty_string() {
        assert_eq!(resolve("anything", &[]).unwrap(), "");
    }

    #[test]
    fn offsets_count_characters() {
        let text = "año: 2024";
        assert_eq!(resolve(text, &[seg(0, 3)]).unwrap(), "año");
        assert_eq!(resolve(text, &[seg(5, 9)]).unwrap(), "2024");
    }

    #[test]
    fn end_of_text_is_a_valid_bound() {
        let doc = DocumentText::new("abc");
        assert_eq!(doc.char_len(), 3);
        assert_eq!(doc.slice(&seg(3, 3)).unwrap(), "");
        assert_eq!(doc.slice(&seg(1, 3)).unwrap(), "bc");
    }

    #[test]
    fn out_of_range_is_an_error() {
        assert_eq!(
            resolve("abc", &[seg(1, 4)]),
            Err(SpanError::OutOfRange {
                start: 1,
                end: 4,
                len: 3
            })
        );
        assert!(resolve("", &[seg(0, 1)]).is_err());
    }

    #[test]
    fn inverted_segment_is_an_error() {
        assert_eq!(
            resolve("abcdef", &[seg(4, 2)]),
            Err(SpanError::Inverted { start: 4, end: 2 })
        );
    }

    #[test]
    fn one_bad_segment_fails_the_whole_span() {
        assert!(resolve("abcdef", &[seg(0, 2), seg(5, 9)]).is_err());
    }
}
