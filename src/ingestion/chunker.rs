/// Splits `text` into windows of `window` characters, each starting `window - overlap`
/// characters after the previous one.
///
/// Windows are measured in `char`s, never bytes. The last window is the first one that
/// reaches the end of the text, so no chunk is made purely of overlap. Blank text yields
/// no chunks.
pub fn chunk_text(text: &str, window: usize, overlap: usize) -> Vec<String> {
    if text.trim().is_empty() || window == 0 {
        return Vec::new();
    }

    let stride = window.saturating_sub(overlap).max(1);
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    let mut chunks = Vec::with_capacity(char_count / stride + 1);
    let mut start = 0;
    loop {
        let end = (start + window).min(char_count);
        chunks.push(text[boundaries[start]..boundaries[end]].to_string());
        if end == char_count {
            break;
        }
        start += stride;
    }
    chunks
}
