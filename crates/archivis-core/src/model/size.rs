/// Size formatting utilities: human-readable byte counts.
///
/// All internal sizes are `u64` bytes. Floating point is only used
/// at the display-formatting boundary and for tier selection.

/// Bytes in one tebibyte (1024^4).
pub const TIB: f64 = 1_099_511_627_776.0;

/// Convert a byte count to tebibytes using binary scaling.
///
/// Naming tiers and summaries both label this value "TB" because that is
/// what drive owners expect to read.
pub fn bytes_to_tib(bytes: u64) -> f64 {
    bytes as f64 / TIB
}

/// Format a byte count into a human-readable string with appropriate unit.
///
/// Uses binary units (KiB = 1024) but labels them with common short forms
/// (KB, MB, GB, TB).
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else if b < TIB {
        format!("{:.2} GB", b / GB)
    } else {
        format!("{:.2} TB", b / TIB)
    }
}

/// Format a file count with thousand separators.
pub fn format_count(count: u64) -> String {
    let s = count.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}
