use std::collections::BTreeMap;

/// Well-known attribute keys used by the interactive selection
pub mod attribute {
    pub const ROLE: &str = "role";
    pub const SITE: &str = "site";
}

/// Device represents a network device loaded from the inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub address: String,
    pub attributes: BTreeMap<String, String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub platform: Option<String>,
}

impl Device {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            attributes: BTreeMap::new(),
            username: None,
            password: None,
            port: None,
            platform: None,
        }
    }

    /// Builder-style helper for setting a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attribute value, treating empty strings as absent
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// DeviceSet is the ordered, deduplicated result of filtering an inventory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSet {
    devices: Vec<Device>,
}

impl DeviceSet {
    /// Build a set, dropping later devices whose name was already seen
    pub fn from_devices<I: IntoIterator<Item = Device>>(devices: I) -> Self {
        let mut seen = std::collections::HashSet::new();
        let devices = devices
            .into_iter()
            .filter(|d| seen.insert(d.name.clone()))
            .collect();
        Self { devices }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Device> {
        self.devices.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a DeviceSet {
    type Item = &'a Device;
    type IntoIter = std::slice::Iter<'a, Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_ignores_empty_values() {
        let device = Device::new("r1", "10.0.0.1")
            .with_attribute("role", "edge")
            .with_attribute("site", "");
        assert_eq!(device.attribute("role"), Some("edge"));
        assert_eq!(device.attribute("site"), None);
        assert_eq!(device.attribute("rack"), None);
    }

    #[test]
    fn test_device_set_dedupes_by_name() {
        let set = DeviceSet::from_devices(vec![
            Device::new("r1", "10.0.0.1"),
            Device::new("r2", "10.0.0.2"),
            Device::new("r1", "10.0.0.99"),
        ]);
        assert_eq!(set.names(), vec!["r1", "r2"]);
        assert_eq!(set.iter().next().map(|d| d.address.as_str()), Some("10.0.0.1"));
    }
}
