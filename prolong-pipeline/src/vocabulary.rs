//! Static token and column vocabularies.
//!
//! Every lookup here is a read-only table. Matching is always done on the
//! trimmed, lowercased form of the input.

/// Month names in calendar order; index + 1 is the month number.
pub const MONTH_NAMES: [&str; 12] = [
    "январь",
    "февраль",
    "март",
    "апрель",
    "май",
    "июнь",
    "июль",
    "август",
    "сентябрь",
    "октябрь",
    "ноябрь",
    "декабрь",
];

/// Display names for report rows, same order as `MONTH_NAMES`.
pub const MONTH_TITLES: [&str; 12] = [
    "Январь",
    "Февраль",
    "Март",
    "Апрель",
    "Май",
    "Июнь",
    "Июль",
    "Август",
    "Сентябрь",
    "Октябрь",
    "Ноябрь",
    "Декабрь",
];

/// Cell tokens that mark a contract as ended.
pub const STOP_TOKENS: &[&str] = &["стоп", "end"];

/// Cell tokens meaning "shipped, but zeroed out".
pub const ZEROED_TOKENS: &[&str] = &["в ноль"];

/// Keywords identifying the account-manager column of the roster, in
/// priority order.
pub const MANAGER_KEYWORDS: &[&str] = &["ам", "am", "менеджер", "account"];

/// Project identifier column, present in both tables.
pub const ID_COLUMN: &str = "id";

/// Free-text scheduled renewal month in the roster.
pub const ROSTER_MONTH_COLUMN: &str = "month";

/// Account label in the shipment table, used when the roster has no manager.
pub const ACCOUNT_COLUMN: &str = "Account";

/// Duplicate-row reason in the shipment table.
pub const DUPLICATE_REASON_COLUMN: &str = "Причина дубля";

/// Label of the synthetic department-wide manager cohort.
pub const DEPARTMENT_LABEL: &str = "Весь отдел";

/// Look up a month number (1..=12) by name.
pub fn month_number(name: &str) -> Option<u32> {
    let name = name.trim().to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u32 + 1)
}

/// Display title for a month number, or `"?"` outside 1..=12.
pub fn month_title(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_TITLES[month as usize - 1],
        _ => "?",
    }
}

/// Lowercase and collapse internal whitespace, so `" В  ноль "` matches `"в ноль"`.
pub fn canonical_token(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn is_stop_token(token: &str) -> bool {
    STOP_TOKENS.contains(&token)
}

pub fn is_zeroed_token(token: &str) -> bool {
    ZEROED_TOKENS.contains(&token)
}
