//! Number formatting utilities.

use std::time::Duration;

/// Format a byte count with thousands separators, e.g. `1,234,567 bytes`.
#[must_use]
pub fn format_bytes(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{out} bytes")
}

/// Format an elapsed time as seconds with one decimal.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}
