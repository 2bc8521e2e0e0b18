//! Free-text sanitizing for message fields.

/// Strip markup and control characters and encode quotes.
///
/// A `<` opens a tag only when followed by a letter, `/`, `!` or `?`;
/// everything from there up to the matching `>` is dropped, and an
/// unterminated tag drops the remainder. Any other `<` is kept as text.
/// Tabs and line breaks survive.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_tag {
            if c == '>' {
                in_tag = false;
            }
            continue;
        }
        match c {
            '<' if chars.peek().is_some_and(|&next| opens_tag(next)) => in_tag = true,
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out
}

fn opens_tag(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?')
}
