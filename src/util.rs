/// Format whole seconds as `m:ss`
pub fn format_time(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Ticks needed to cover `secs` at `tick_ms`, rounding up
pub fn ticks_for(secs: u32, tick_ms: u64) -> u64 {
    let ms = u64::from(secs) * 1000;
    ms.div_ceil(tick_ms.max(1))
}
