/// Timestamped progress line, similar to `info!` in tracing.
/// With a starting time as the first argument it also prints how long the
/// step took.
/// ```ignore
/// info_time!("processed page {}", 3);
/// let time = Local::now();
/// info_time!(time, "processed page {}", 3);
/// ```
#[macro_export]
macro_rules! info_time {
    ($strfm:literal $(,)? $($arg:expr),*) => {{
        let local_now = Local::now();
        println!("{:<30} : {}", local_now, format!($strfm, $($arg),*));
    }};
    ($time:expr, $strfm:literal $(,)? $($arg:expr),*) => {{
        let local_now = Local::now();
        let run_time = (local_now - $time)
                .num_microseconds()
                .map(|n| n as f64 / 1_000_000.0)
                .unwrap_or(0.0);
        println!(
            "{:<30} : {} ({run_time:.2} sec)",
            local_now,
            format!($strfm, $($arg),*)
        );
    }};
}

/// Same shape as `info_time!` but tagged, for retries and skipped rows.
#[macro_export]
macro_rules! warn_time {
    ($strfm:literal $(,)? $($arg:expr),*) => {{
        let local_now = Local::now();
        println!("{:<30} : WARN {}", local_now, format!($strfm, $($arg),*));
    }};
}
