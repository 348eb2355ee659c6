pub mod action_executor;
pub mod config;
pub mod dispatch;
pub mod engines;
pub mod foreground;
pub mod history;
pub mod hotkey;
pub mod hotkey_listener;
pub mod hotkey_runtime;
pub mod logging;
pub mod panel;
pub mod persistence;
pub mod runtime;
pub mod settings;
pub mod visibility;

#[cfg(test)]
mod tests {
    mod dispatch_latency_test {
        include!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../tests/perf/dispatch_latency_test.rs"
        ));
    }
}
