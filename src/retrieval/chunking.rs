/// Splits extracted document text into consecutive word-count-bounded chunks.
///
/// Words are whitespace-delimited; each chunk holds up to `max_words` words
/// re-joined with single spaces, in original order, with no overlap. The
/// final chunk may be shorter. Empty input yields no chunks. Pure and
/// deterministic, safe to re-run on the same text.
pub fn chunk_words(text: &str, max_words: usize) -> Vec<String> {
    if max_words == 0 {
        return vec![];
    }

    let words: Vec<&str> = text.split_whitespace().collect();

    words
        .chunks(max_words)
        .map(|group| group.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_words("", 400).is_empty());
        assert!(chunk_words("   \n\t  ", 400).is_empty());
    }

    #[test]
    fn short_text_yields_one_chunk() {
        let chunks = chunk_words("one two three", 400);
        assert_eq!(chunks, vec!["one two three"]);
    }

    #[test]
    fn chunk_count_is_ceil_of_words_over_max() {
        let text = (0..850).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = chunk_words(&text, 400);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].split_whitespace().count(), 400);
        assert_eq!(chunks[1].split_whitespace().count(), 400);
        assert_eq!(chunks[2].split_whitespace().count(), 50);
    }

    #[test]
    fn all_words_preserved_in_order() {
        let text = "a  b\tc\nd e f g";
        let chunks = chunk_words(text, 3);
        let rejoined = chunks.join(" ");
        let expected: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined.split_whitespace().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn every_chunk_but_last_is_full() {
        let text = (0..10).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let chunks = chunk_words(&text, 4);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].split_whitespace().count(), 4);
        assert_eq!(chunks[1].split_whitespace().count(), 4);
        assert_eq!(chunks[2].split_whitespace().count(), 2);
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "alpha beta gamma delta epsilon zeta";
        assert_eq!(chunk_words(text, 2), chunk_words(text, 2));
    }

    #[test]
    fn zero_max_words_yields_nothing() {
        assert!(chunk_words("a b c", 0).is_empty());
    }
}
