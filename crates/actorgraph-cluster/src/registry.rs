// ABOUTME: Known-infrastructure address table behind the cluster resolver
// ABOUTME: Built-in entries plus caller extensions, matched case-insensitively

use actorgraph_core::InfraRegistry;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

static BUILTIN_INFRA: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut table = FxHashMap::default();
    table.insert("0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be", "binance_hot_1");
    table.insert("0x28c6c06298d514db089934071355e5743bf21d60", "binance_hot_2");
    table.insert("0x71660c4005ba85c37ccec55d0c4493e66fe775d3", "coinbase_1");
    table.insert("0x503828976d22510aad0201ac7ec88293211d23da", "coinbase_2");
    table.insert("0x2910543af39aba0cd09dbb2d50200b3e800a63d2", "kraken_hot");
    table.insert("0x6cc5f688a315f3dc28a7781717a9a798a59fda7b", "okx_hot");
    table.insert("0x722122df12d4e14e13ac3b6895a86e84145b6967", "tornado_cash_router");
    table.insert("0x3ee18b2214aff97000d974cf647e7c347e8fa585", "wormhole_bridge");
    table
});

/// [`InfraRegistry`] backed by the built-in table. Extensions registered
/// at runtime shadow built-in entries with the same address.
pub struct StaticInfraRegistry {
    extra: RwLock<FxHashMap<String, String>>,
}

impl StaticInfraRegistry {
    pub fn new() -> Self {
        Self {
            extra: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let registry = Self::new();
        registry.extend(entries);
        registry
    }

    pub fn extend<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut extra = self.extra.write();
        for (address, infra_id) in entries {
            extra.insert(address.trim().to_lowercase(), infra_id);
        }
    }

    pub fn builtin_len() -> usize {
        BUILTIN_INFRA.len()
    }
}

impl Default for StaticInfraRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InfraRegistry for StaticInfraRegistry {
    fn lookup(&self, address: &str) -> Option<String> {
        let needle = address.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        if let Some(infra_id) = self.extra.read().get(&needle) {
            return Some(infra_id.clone());
        }
        BUILTIN_INFRA
            .get(needle.as_str())
            .map(|infra_id| (*infra_id).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_is_case_insensitive() {
        let registry = StaticInfraRegistry::new();
        let infra = registry.lookup("0x3F5CE5FBFE3E9AF3971DD833D26BA9B5C936F0BE");
        assert_eq!(infra.as_deref(), Some("binance_hot_1"));
    }

    #[test]
    fn unknown_and_blank_addresses_miss() {
        let registry = StaticInfraRegistry::new();
        assert!(registry.lookup("0xdeadbeef").is_none());
        assert!(registry.lookup("   ").is_none());
    }

    #[test]
    fn extensions_shadow_builtin_entries() {
        let registry = StaticInfraRegistry::with_entries(vec![(
            "0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be".to_string(),
            "custom_override".to_string(),
        )]);
        assert_eq!(
            registry
                .lookup("0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be")
                .as_deref(),
            Some("custom_override")
        );

        registry.extend(vec![("SoLaNaVenue42".to_string(), "sol_venue".to_string())]);
        assert_eq!(registry.lookup("solanavenue42").as_deref(), Some("sol_venue"));
        assert!(StaticInfraRegistry::builtin_len() >= 8);
    }
}
