use std::sync::{Mutex, OnceLock};

/// Every variable `Config::load` reads.
pub(crate) const CONFIG_ENV_VARS: &[&str] = &[
    "THIRDWEB_SECRET_KEY",
    "THIRDWEB_CLIENT_ID",
    "SIDESHIFT_SECRET",
    "SIDESHIFT_AFFILIATE_ID",
    "SIDESHIFT_AFFILIATE",
    "POLYPUFF_PORT",
    "POLYPUFF_CHAT_URL",
    "POLYPUFF_SIDESHIFT_URL",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Runs `run` with `vars` applied (`None` = removed), then restores the
/// previous values. Holds the process-wide env lock for the whole call.
pub(crate) fn with_env<R>(vars: &[(&str, Option<&str>)], run: impl FnOnce() -> R) -> R {
    let _guard = env_lock().lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(k, _)| (k.to_string(), std::env::var(k).ok()))
        .collect();
    for (key, value) in vars {
        write_env_var(key, *value);
    }
    let result = run();
    for (key, value) in &saved {
        write_env_var(key, value.as_deref());
    }
    result
}

fn write_env_var(key: &str, value: Option<&str>) {
    // SAFETY: only called while holding `env_lock`.
    unsafe {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
}
