//! Shared utilities for CLI commands

use helper_core::MetricsSnapshot;
use owo_colors::OwoColorize;
use std::time::Duration;

/// Print the end-of-run metrics block
pub fn print_summary(snapshot: &MetricsSnapshot) {
    println!();
    println!("{}", "Session summary".bold());
    println!("  {}: {}", "Files processed".dimmed(), snapshot.operations);
    println!("  {}: {}", "Subtasks generated".dimmed(), snapshot.tasks.green());
    println!("  {}: {}", "Estimated tokens".dimmed(), snapshot.tokens);
    if snapshot.errors > 0 {
        println!("  {}: {}", "Errors".dimmed(), snapshot.errors.red());
    } else {
        println!("  {}: {}", "Errors".dimmed(), snapshot.errors);
    }
    println!("  {}: {}", "Time processing".dimmed(), format_duration(snapshot.busy));
}

/// Human-readable duration ("850ms", "12.4s", "3m 05s")
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
