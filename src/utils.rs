/// Render a unix timestamp as Discord's long date-time markup, e.g.
/// `<t:1700000000:F>`. The client localizes it for each viewer.
pub fn discord_timestamp(unix_secs: i64) -> String {
    format!("<t:{}:F>", unix_secs)
}
