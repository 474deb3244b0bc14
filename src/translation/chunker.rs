/*!
 * Sentence-aware text chunking.
 *
 * Splits OCR text into pieces the translation engine accepts. Lengths are
 * counted in characters, never bytes, so multi-byte scripts are measured the
 * same way the engine's character budget is.
 */

/// Sentence delimiter used to find split points
const SENTENCE_DELIMITER: &str = ". ";

/// Smallest usable limit; hard slicing needs room for at least one character
const MIN_LIMIT: usize = 2;

/// Splits text into chunks strictly shorter than a character limit
pub struct TextChunker;

impl TextChunker {
    /// Split `text` into ordered chunks, each shorter than `limit` characters.
    ///
    /// Sentences (delimited by `". "`) are packed greedily. A sentence that is
    /// too long on its own is hard-sliced into `limit - 1` character pieces,
    /// with leading whitespace dropped from each continuation.
    pub fn split(text: &str, limit: usize) -> Vec<String> {
        let limit = limit.max(MIN_LIMIT);

        if char_len(text) < limit {
            return vec![text.to_string()];
        }

        let fragments: Vec<&str> = text.trim_end().split(SENTENCE_DELIMITER).collect();
        let last = fragments.len() - 1;

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for (i, fragment) in fragments.into_iter().enumerate() {
            let mut sentence = if i < last {
                format!("{}{}", fragment, SENTENCE_DELIMITER)
            } else {
                fragment.to_string()
            };
            let mut sentence_len = char_len(&sentence);

            if current_len + sentence_len < limit {
                current.push_str(&sentence);
                current_len += sentence_len;
                continue;
            }

            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }

            while sentence_len >= limit {
                let split_at = byte_offset(&sentence, limit - 1);
                chunks.push(sentence[..split_at].to_string());
                sentence = sentence[split_at..].trim_start().to_string();
                sentence_len = char_len(&sentence);
            }

            current = sentence;
            current_len = sentence_len;
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the `chars`-th character, or the end of the string
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}
