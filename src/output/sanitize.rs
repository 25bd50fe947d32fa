// Final cleanup of diagram text before it is written out

use regex::Regex;
use std::sync::LazyLock;

/// Tag-like markup: `<b>`, `</span>`, `<br/>`. Never spans lines, so the
/// Mermaid arrows `<|--` and `<..` are left alone.
static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[A-Za-z][^<>\n]*>").unwrap());

/// Strip markup and non-printable characters, normalize newlines, trim
///
/// Idempotent: sanitizing sanitized text changes nothing.
pub fn sanitize(text: &str) -> String {
    let printable: String = text
        .chars()
        .filter(|&c| matches!(c, ' '..='~' | '\n' | '\r'))
        .collect();

    let mut stripped = printable;
    loop {
        let next = MARKUP.replace_all(&stripped, "").into_owned();
        if next == stripped {
            break;
        }
        stripped = next;
    }

    stripped
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .to_string()
}
