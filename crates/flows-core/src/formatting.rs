//! Human-readable number formatting for pipeline log output.

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use flows_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a scaled epsilon so exact binary midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let grouped = group_thousands(&(rounded.trunc() as u64).to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", rounded.fract(), prec = decimals as usize);
        // "0.50" -> ".50"
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format an integral count with thousands separators.
///
/// ```
/// use flows_core::formatting::format_count;
///
/// assert_eq!(format_count(12_345), "12,345");
/// ```
pub fn format_count(count: usize) -> String {
    group_thousands(&count.to_string())
}

/// Format a `[0, 1]` ratio as a percentage with one decimal.
///
/// ```
/// use flows_core::formatting::format_ratio;
///
/// assert_eq!(format_ratio(0.553), "55.3%");
/// assert_eq!(format_ratio(1.0), "100.0%");
/// ```
pub fn format_ratio(ratio: f64) -> String {
    format!("{}%", format_number(ratio * 100.0, 1))
}

/// Format a byte count as kilobytes, or megabytes from 1 MiB upwards.
///
/// ```
/// use flows_core::formatting::format_size;
///
/// assert_eq!(format_size(2048), "2.0 KB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let bytes = bytes as f64;
    if bytes >= KIB * KIB {
        format!("{} MB", format_number(bytes / (KIB * KIB), 1))
    } else {
        format!("{} KB", format_number(bytes / KIB, 1))
    }
}

/// Format elapsed seconds with one decimal, e.g. `"4.2s"`.
pub fn format_duration(seconds: f64) -> String {
    format!("{}s", format_number(seconds, 1))
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let remainder = s.len() % 3;
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i != 0 && i % 3 == remainder {
            result.push(',');
        }
        result.push(c);
    }
    result
}
