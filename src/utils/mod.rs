//! Presentation helpers shared by embedding UIs.

use chrono::{DateTime, Utc};

/// "5:00"-style rendering of a countdown in seconds.
pub fn format_countdown(total_secs: u32) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Relative timestamp for feed rows and comments: minutes, then hours, days
/// and weeks, falling back to an "Aug 5"-style date after four weeks.
pub fn format_time_ago(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(date);

    let mins = elapsed.num_minutes().max(0);
    if mins < 60 {
        return format!("{} min{} ago", mins, plural(mins));
    }

    let hrs = elapsed.num_hours();
    if hrs < 24 {
        return format!("{} hr{} ago", hrs, plural(hrs));
    }

    let days = elapsed.num_days();
    if days < 7 {
        return format!("{} day{} ago", days, plural(days));
    }

    let weeks = days / 7;
    if weeks < 4 {
        return format!("{} week{} ago", weeks, plural(weeks));
    }

    date.format("%b %-d").to_string()
}

fn plural(count: i64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
