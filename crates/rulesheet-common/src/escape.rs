//! [CSSOM § 2.1 Serializing identifiers](https://drafts.csswg.org/cssom/#serialize-an-identifier)
//!
//! Generated class names and keyframes names are derived from user keys, so
//! they may contain characters that carry meaning inside a selector. Those
//! characters get a backslash in front of them.

/// Characters that terminate or change the meaning of a compound selector.
const SPECIAL: &[char] = &[
    '[', ']', '.', '#', '*', '$', '>', '<', '+', '~', '=', '|', '^', ':', '(', ')', ',', '"',
    '\'', '`',
];

/// Escape `ident` so it can be used after `.` in a class selector.
///
/// ASCII whitespace is escaped as well.
#[must_use]
pub fn escape(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for c in ident.chars() {
        if SPECIAL.contains(&c) || c.is_ascii_whitespace() {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
