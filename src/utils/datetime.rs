use jiff::Timestamp;

/// Format a timestamp into a short relative string like "2d ago", "3h ago",
/// "15m ago", or "just now".
pub fn format_relative(timestamp: Timestamp, now: Timestamp) -> String {
    // Future timestamps (clock skew) read as just now
    if now <= timestamp {
        return "just now".to_string();
    }

    let delta = now.duration_since(timestamp).as_secs();
    let days = delta / 86_400;
    if days > 0 {
        return format!("{}d ago", days);
    }

    let hours = delta / 3_600;
    if hours > 0 {
        return format!("{}h ago", hours);
    }

    let minutes = delta / 60;
    if minutes > 0 {
        return format!("{}m ago", minutes);
    }

    "just now".to_string()
}

/// Relative age of an optional timestamp against the current time.
pub fn format_age(timestamp: Option<Timestamp>) -> String {
    match timestamp {
        Some(ts) => format_relative(ts, Timestamp::now()),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn ago(now: Timestamp, secs: i64) -> Timestamp {
        now.checked_sub(SignedDuration::from_secs(secs)).unwrap()
    }

    #[test]
    fn returns_just_now_for_current_and_future() {
        let now = Timestamp::now();
        assert_eq!(format_relative(now, now), "just now");
        let future = now.checked_add(SignedDuration::from_secs(10)).unwrap();
        assert_eq!(format_relative(future, now), "just now");
    }

    #[test]
    fn returns_minutes_hours_and_days() {
        let now: Timestamp = "2024-06-01T12:00:00Z".parse().unwrap();

        assert_eq!(format_relative(ago(now, 30), now), "just now");
        assert_eq!(format_relative(ago(now, 5 * 60), now), "5m ago");
        assert_eq!(format_relative(ago(now, 2 * 3_600), now), "2h ago");
        assert_eq!(format_relative(ago(now, 3 * 86_400), now), "3d ago");
    }

    #[test]
    fn missing_timestamp_is_unknown() {
        assert_eq!(format_age(None), "unknown");
    }
}
