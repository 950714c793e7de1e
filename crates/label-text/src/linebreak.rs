//! Line wrapping and clamping for fixed-size text boxes
//!
//! Measurement is supplied by the caller as a `fits` predicate so the same
//! logic serves estimated widths and real font metrics alike.

/// Greedily wrap one paragraph (no `\n`) into lines that satisfy `fits`
///
/// Breaks after the last space that keeps the line fitting; a word wider
/// than the box is broken between characters. A single character that does
/// not fit still gets its own line.
pub fn wrap_paragraph<F>(text: &str, fits: &F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let mut lines = Vec::new();
    let mut rest: Vec<char> = text.trim_end().chars().collect();

    while !rest.is_empty() {
        let whole: String = rest.iter().collect();
        if fits(&whole) {
            lines.push(whole);
            break;
        }

        // longest fitting prefix, at least one character
        let mut end = 1;
        while end < rest.len() {
            let candidate: String = rest[..=end].iter().collect();
            if !fits(&candidate) {
                break;
            }
            end += 1;
        }

        // prefer breaking at whitespace inside the prefix
        let split = rest[..end]
            .iter()
            .rposition(|c| c.is_whitespace())
            .filter(|&pos| pos > 0)
            .unwrap_or(end);

        let line: String = rest[..split].iter().collect();
        lines.push(line.trim_end().to_string());

        let mut next = split;
        while next < rest.len() && rest[next].is_whitespace() {
            next += 1;
        }
        rest.drain(..next);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Shorten `line` until `line + ellipsis` satisfies `fits`
pub fn ellipsize<F>(line: &str, ellipsis: &str, fits: &F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut chars: Vec<char> = line.trim_end().chars().collect();

    loop {
        let head: String = chars.iter().collect();
        let candidate = format!("{}{ellipsis}", head.trim_end());
        if chars.is_empty() || fits(&candidate) {
            return candidate;
        }
        chars.pop();
    }
}

/// Wrap `text` and clamp it to at most `max_lines` lines
///
/// Explicit `\n` breaks are always kept, so a text with more paragraphs than
/// `max_lines` keeps one line per paragraph. When wrapped lines have to be
/// dropped, the last kept line of that paragraph ends with `ellipsis`.
pub fn clamp_lines<F>(text: &str, max_lines: usize, ellipsis: &str, fits: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let paragraphs: Vec<&str> = text.split('\n').map(|p| p.trim_end_matches('\r')).collect();
    let budget = max_lines.max(paragraphs.len());

    let mut lines = Vec::with_capacity(budget);
    for (index, paragraph) in paragraphs.iter().enumerate() {
        let reserved = paragraphs.len() - index - 1;
        let allowed = budget.saturating_sub(lines.len() + reserved).max(1);

        let wrapped = wrap_paragraph(paragraph, &fits);
        if wrapped.len() <= allowed {
            lines.extend(wrapped);
            continue;
        }

        let mut kept: Vec<String> = wrapped.into_iter().take(allowed).collect();
        if let Some(last) = kept.pop() {
            kept.push(ellipsize(&last, ellipsis, &fits));
        }
        lines.extend(kept);
    }

    lines
}
