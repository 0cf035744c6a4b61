use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string in terminal columns.
///
/// Unicode-aware: CJK characters and most emoji occupy two columns,
/// combining marks occupy zero.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Ellipsis appended when truncation cuts text off
const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Truncate a string to fit within a maximum display width, appending "..."
/// when text was cut off.
///
/// Returns `Cow::Borrowed` when the string already fits (no allocation on the
/// common render path). For widths of 3 columns or fewer there is no room for
/// a character plus the ellipsis, so as many characters as fit are returned
/// without one.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    // Narrow widths: no ellipsis, just whatever fits
    if max_width <= ELLIPSIS_WIDTH {
        let mut out = String::new();
        let mut used = 0;
        for c in s.chars() {
            let w = UnicodeWidthChar::width(c).unwrap_or(0);
            if used + w > max_width {
                break;
            }
            used += w;
            out.push(c);
        }
        return Cow::Owned(out);
    }

    let target = max_width - ELLIPSIS_WIDTH;
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > target {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(ELLIPSIS);
    Cow::Owned(out)
}

/// Strip control characters from a string.
///
/// Recipe names, usernames, and generated content all end up in single-line
/// list rows; embedded newlines or escape sequences would corrupt the
/// terminal layout. Returns `Cow::Borrowed` when nothing needs stripping.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if s.chars().any(char::is_control) {
        Cow::Owned(s.chars().filter(|c| !c.is_control()).collect())
    } else {
        Cow::Borrowed(s)
    }
}
