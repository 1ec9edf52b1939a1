/// Renders a second count as `MM:SS`, or `HH:MM:SS` once it reaches an hour.
///
/// The hour field is padded to two digits but never truncated, so 100 hours
/// renders as `100:00:00`.
pub fn format_time(seconds: u64) -> String {
    let total_minutes = seconds / 60;
    let secs = seconds % 60;
    if total_minutes >= 60 {
        let hours = total_minutes / 60;
        let minutes = total_minutes % 60;
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{total_minutes:02}:{secs:02}")
    }
}
