// SPDX-License-Identifier: Apache-2.0

/// Test-only helpers.
///
/// Keep this module lightweight and dependency-free so `cargo test` works out
/// of the box.
pub fn config_test_logger() {
    // Intentionally a no-op.
    // Some tests call this to enable logging in downstream repos; strx doesn't
    // require a logger for correctness.
}

/// Serializes tests that rebuild the process-wide dispatch table.
///
/// `update()` is documented as not thread-safe against concurrent `update()`;
/// the test harness runs tests in parallel, so lifecycle tests share this lock.
pub fn dispatch_test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
