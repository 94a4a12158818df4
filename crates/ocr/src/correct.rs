//! Repairs letter/digit confusions inside numeric-looking clusters.
//!
//! A cluster is a maximal run of alphanumeric characters. Clusters without a
//! single ASCII digit are returned untouched so labels like `ODO` or `MILES`
//! never turn into numbers. Once a cluster holds a digit, every confusable
//! letter in it is substituted.

/// The digit an OCR engine most likely misread as `c`, if any.
fn confusable_digit(c: char) -> Option<char> {
    match c {
        'O' | 'o' | 'D' | 'Q' => Some('0'),
        'I' | 'l' => Some('1'),
        'Z' | 'z' => Some('2'),
        'S' | 's' => Some('5'),
        'G' | 'b' => Some('6'),
        'T' => Some('7'),
        'B' => Some('8'),
        'g' | 'q' => Some('9'),
        _ => None,
    }
}

/// Correct every cluster in `text`, keeping separators as they are.
pub fn correct(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(char::is_alphanumeric) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let end = tail.find(|c: char| !c.is_alphanumeric()).unwrap_or(tail.len());
        correct_cluster(&tail[..end], &mut out);
        rest = &tail[end..];
    }
    out.push_str(rest);

    if out != text {
        tracing::debug!("OCR correction: '{text}' -> '{out}'");
    }
    out
}

fn correct_cluster(cluster: &str, out: &mut String) {
    if !cluster.chars().any(|c| c.is_ascii_digit()) {
        out.push_str(cluster);
        return;
    }
    out.extend(cluster.chars().map(|c| confusable_digit(c).unwrap_or(c)));
}
