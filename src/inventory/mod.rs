mod loader;

pub use loader::{load_commands, load_hosts};

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Device, DeviceSet};

/// Sorted, distinct values of `key` across devices. Devices without a
/// non-empty value for `key` contribute nothing.
pub fn distinct_values(devices: &[Device], key: &str) -> Vec<String> {
    devices
        .iter()
        .filter_map(|d| d.attribute(key))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Devices matching every `key == value` constraint. An empty constraint
/// set matches the whole inventory; no match is an empty set, not an error.
pub fn filter(devices: &[Device], constraints: &BTreeMap<String, String>) -> DeviceSet {
    DeviceSet::from_devices(
        devices
            .iter()
            .filter(|d| {
                constraints
                    .iter()
                    .all(|(k, v)| d.attributes.get(k) == Some(v))
            })
            .cloned(),
    )
}

/// Convenience for the role/site selection the CLI performs
pub fn filter_role_site(devices: &[Device], role: &str, site: &str) -> DeviceSet {
    let constraints = BTreeMap::from([
        (crate::models::attribute::ROLE.to_string(), role.to_string()),
        (crate::models::attribute::SITE.to_string(), site.to_string()),
    ]);
    filter(devices, &constraints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inventory() -> Vec<Device> {
        vec![
            Device::new("r1", "10.0.0.1")
                .with_attribute("role", "edge")
                .with_attribute("site", "nyc"),
            Device::new("r2", "10.0.0.2")
                .with_attribute("role", "edge")
                .with_attribute("site", "sfo"),
            Device::new("s1", "10.0.1.1")
                .with_attribute("role", "spine")
                .with_attribute("site", "nyc"),
            Device::new("oob1", "10.0.9.1").with_attribute("site", "nyc"),
        ]
    }

    #[test]
    fn test_distinct_values_sorted_and_deduped() {
        let devices = inventory();
        assert_eq!(distinct_values(&devices, "role"), vec!["edge", "spine"]);
        assert_eq!(distinct_values(&devices, "site"), vec!["nyc", "sfo"]);
        assert!(distinct_values(&devices, "rack").is_empty());
    }

    #[test]
    fn test_filter_role_site() {
        let devices = inventory();
        let matched = filter_role_site(&devices, "edge", "nyc");
        assert_eq!(matched.names(), vec!["r1"]);
        assert!(filter_role_site(&devices, "spine", "sfo").is_empty());
    }

    #[test]
    fn test_filter_empty_constraints_returns_everything() {
        let devices = inventory();
        let matched = filter(&devices, &BTreeMap::new());
        assert_eq!(matched.len(), devices.len());
    }

    fn arb_device() -> impl Strategy<Value = Device> {
        (
            "[a-z]{1,4}[0-9]{0,2}",
            prop::option::of(prop::sample::select(vec!["edge", "spine", "leaf", ""])),
            prop::option::of(prop::sample::select(vec!["nyc", "sfo", "lon"])),
        )
            .prop_map(|(name, role, site)| {
                let mut d = Device::new(name, "192.0.2.1");
                if let Some(role) = role {
                    d = d.with_attribute("role", role);
                }
                if let Some(site) = site {
                    d = d.with_attribute("site", site);
                }
                d
            })
    }

    proptest! {
        #[test]
        fn distinct_values_are_sorted_unique_and_sourced(devices in prop::collection::vec(arb_device(), 0..24)) {
            let values = distinct_values(&devices, "role");
            prop_assert!(values.windows(2).all(|w| w[0] < w[1]));
            for v in &values {
                prop_assert!(!v.is_empty());
                prop_assert!(devices.iter().any(|d| d.attributes.get("role") == Some(v)));
            }
            for d in &devices {
                if let Some(role) = d.attribute("role") {
                    prop_assert!(values.iter().any(|v| v == role));
                }
            }
        }

        #[test]
        fn filter_is_sound_and_complete(
            devices in prop::collection::vec(arb_device(), 0..24),
            role in prop::sample::select(vec!["edge", "spine", "leaf"]),
            site in prop::sample::select(vec!["nyc", "sfo", "lon"]),
        ) {
            let matched = filter_role_site(&devices, role, site);
            for d in &matched {
                prop_assert_eq!(d.attributes.get("role").map(String::as_str), Some(role));
                prop_assert_eq!(d.attributes.get("site").map(String::as_str), Some(site));
                prop_assert!(devices.contains(d));
            }
            for d in &devices {
                let wanted = d.attributes.get("role").map(String::as_str) == Some(role)
                    && d.attributes.get("site").map(String::as_str) == Some(site);
                if wanted {
                    prop_assert!(matched.iter().any(|m| m.name == d.name));
                }
            }
        }
    }
}
