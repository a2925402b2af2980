//! Utility functions for formatting
//!
//! Prices are kept in thousands of VND. Everything user-facing goes through
//! [`format_vnd`] so the ×1000 scaling lives in exactly one place.

/// Stored price unit → displayed VND
pub const SUB_UNIT_SCALE: i128 = 1000;

/// Currency glyph appended to displayed amounts
pub const VND_SYMBOL: &str = "₫";

/// Group decimal digits by three with `.` (Vietnamese convention).
///
/// # Examples
/// ```
/// use goldwatch::utils::group_thousands;
///
/// assert_eq!(group_thousands(1234567), "1.234.567");
/// assert_eq!(group_thousands(999), "999");
/// ```
pub fn group_thousands(value: u128) -> String {
    let digits = value.to_string();

    digits
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec!['.', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect()
}

/// Format a stored price (thousands of VND) for display: "5.000.000 ₫".
///
/// The sign is dropped: deltas carry their direction in the wording.
///
/// # Examples
/// ```
/// use goldwatch::utils::format_vnd;
///
/// assert_eq!(format_vnd(5000), "5.000.000 ₫");
/// assert_eq!(format_vnd(-20), "20.000 ₫");
/// ```
pub fn format_vnd(amount: i64) -> String {
    let scaled = (i128::from(amount) * SUB_UNIT_SCALE).unsigned_abs();
    format!("{} {}", group_thousands(scaled), VND_SYMBOL)
}
