use std::collections::HashMap;
use std::sync::LazyLock;

use super::KeyValueStat;

/// Host memory figures from `/proc/meminfo`. Values are in kibibytes as reported by the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemInfo {
    pub mem_total_kb: u64,
    pub mem_free_kb: u64,
    pub mem_available_kb: u64,
    pub swap_total_kb: u64,
    pub swap_free_kb: u64,
}

impl MemInfo {
    pub fn total_bytes(&self) -> u64 {
        self.mem_total_kb.saturating_mul(1024)
    }

    /// Memory in use, i.e. total minus available.
    ///
    /// Kernels older than 3.14 have no `MemAvailable`; `MemFree` is used there instead.
    pub fn used_bytes(&self) -> u64 {
        let available = if self.mem_available_kb > 0 {
            self.mem_available_kb
        } else {
            self.mem_free_kb
        };
        self.mem_total_kb
            .saturating_sub(available)
            .saturating_mul(1024)
    }

    pub fn swap_total_bytes(&self) -> u64 {
        self.swap_total_kb.saturating_mul(1024)
    }

    pub fn swap_used_bytes(&self) -> u64 {
        self.swap_total_kb
            .saturating_sub(self.swap_free_kb)
            .saturating_mul(1024)
    }
}

type Setter = fn(&mut MemInfo, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(5);

    m.insert("MemTotal:", |s, v| s.mem_total_kb = v);
    m.insert("MemFree:", |s, v| s.mem_free_kb = v);
    m.insert("MemAvailable:", |s, v| s.mem_available_kb = v);
    m.insert("SwapTotal:", |s, v| s.swap_total_kb = v);
    m.insert("SwapFree:", |s, v| s.swap_free_kb = v);

    m
});

impl KeyValueStat for MemInfo {
    const ALLOW_DUPLICATE_KEYS: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}
