use std::collections::HashMap;
use std::sync::LazyLock;

use super::KeyValueStat;

/// The `Threads:` field of `/proc/<pid>/status`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessStatus {
    pub threads: u64,
}

static SETTERS: LazyLock<HashMap<&'static str, fn(&mut ProcessStatus, u64)>> =
    LazyLock::new(|| {
        let mut m: HashMap<&'static str, fn(&mut ProcessStatus, u64)> = HashMap::with_capacity(1);
        m.insert("Threads:", |s, v| s.threads = v);
        m
    });

impl KeyValueStat for ProcessStatus {
    const ALLOW_DUPLICATE_KEYS: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}
