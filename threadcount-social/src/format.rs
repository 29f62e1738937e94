/// Numbers that go into one status post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSummary {
    pub total: u64,
    pub delta: i64,
    pub mau: u64,
}

/// Render the three-line status text.
///
/// ```
/// use threadcount_social::{StatusSummary, format_status};
///
/// let text = format_status(&StatusSummary { total: 1500, delta: 1500, mau: 300 }, "Lemmy/kbin");
/// assert_eq!(
///     text,
///     "1,500 Lemmy/kbin accounts\n+1,500 in the last hour\n300 monthly active users"
/// );
/// ```
pub fn format_status(summary: &StatusSummary, label: &str) -> String {
    let sign = if summary.delta > 0 { "+" } else { "" };
    format!(
        "{} {label} accounts\n{sign}{} in the last hour\n{} monthly active users",
        group_thousands(summary.total as i128),
        group_thousands(summary.delta as i128),
        group_thousands(summary.mau as i128),
    )
}

/// `1234567` -> `1,234,567`; negative values keep their `-`.
pub fn group_thousands(n: i128) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
