//! Fixed-size chunking for the sequential chunk-scan strategy.

/// Splits `text` into trimmed chunks of at most `max_chars` characters.
///
/// A chunk that is not the last one is cut back to its last space when that
/// space lies beyond 80% of the chunk, so words stay whole. Chunks that are
/// empty after trimming are skipped.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let mut size = max_chars.min(chars.len() - pos);
        if pos + size < chars.len() {
            if let Some(last_space) = chars[pos..pos + size].iter().rposition(|&c| c == ' ') {
                if last_space * 5 > size * 4 {
                    size = last_space;
                }
            }
        }

        let chunk: String = chars[pos..pos + size].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        pos += size;
    }
    chunks
}
