//! Ad slot selection.
//!
//! Ads come from `[[ads]]` config entries. Each page asks for one ad per
//! slot; the choice among eligible entries is a stable hash of the page
//! key, so a page shows the same ad on every render and different pages
//! spread across the entries.

use crate::config::AdConfig;

/// Polynomial string hash (`h * 31 + byte`), stable across runs and builds.
pub fn stable_hash(key: &str) -> u64 {
    key.bytes()
        .fold(0u64, |h, b| h.wrapping_mul(31).wrapping_add(u64::from(b)))
}

/// Pick the ad shown in `slot` on the page identified by `page_key`.
pub fn pick_ad<'a>(ads: &'a [AdConfig], slot: &str, page_key: &str) -> Option<&'a AdConfig> {
    let eligible: Vec<&AdConfig> = ads
        .iter()
        .filter(|ad| ad.slots.iter().any(|s| s == slot))
        .collect();

    if eligible.is_empty() {
        return None;
    }

    let i = (stable_hash(page_key) % eligible.len() as u64) as usize;
    Some(eligible[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ad(name: &str, slots: &[&str]) -> AdConfig {
        AdConfig {
            name: name.into(),
            description: format!("{} description", name),
            website: format!("https://{}.dev", name),
            slots: slots.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_stable_hash_known_values() {
        assert_eq!(stable_hash(""), 0);
        assert_eq!(stable_hash("a"), 97);
        assert_eq!(stable_hash("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_pick_is_deterministic() {
        let ads = vec![ad("a", &["tool"]), ad("b", &["tool"]), ad("c", &["tool"])];
        let first = pick_ad(&ads, "tool", "/tools/gitea");
        for _ in 0..10 {
            assert_eq!(pick_ad(&ads, "tool", "/tools/gitea"), first);
        }
    }

    #[test]
    fn test_only_eligible_slots() {
        let ads = vec![ad("a", &["listing"]), ad("b", &["tool"])];
        assert_eq!(pick_ad(&ads, "tool", "anything").unwrap().name, "b");
        assert!(pick_ad(&ads, "category", "anything").is_none());
        assert!(pick_ad(&[], "tool", "x").is_none());
    }

    #[test]
    fn test_index_follows_hash() {
        let ads = vec![ad("a", &["tool"]), ad("b", &["tool"])];
        // stable_hash("a") = 97 -> odd -> second entry
        assert_eq!(pick_ad(&ads, "tool", "a").unwrap().name, "b");
        assert_eq!(pick_ad(&ads, "tool", "").unwrap().name, "a");
    }
}
