use crate::models::VmSize;

/// Closed mapping from [`VmSize`] to a provider SKU string.
///
/// Kept as data so a different provider (or region) can swap SKUs without
/// touching the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuTable {
    pub small: String,
    pub medium: String,
    pub large: String,
}

impl SkuTable {
    pub fn new(
        small: impl Into<String>,
        medium: impl Into<String>,
        large: impl Into<String>,
    ) -> Self {
        Self {
            small: small.into(),
            medium: medium.into(),
            large: large.into(),
        }
    }

    /// Azure general-purpose SSD-backed sizes
    pub fn azure() -> Self {
        Self::new("Standard_DS1_v2", "Standard_DS2_v2", "Standard_DS3_v2")
    }

    pub fn sku_for(&self, size: VmSize) -> &str {
        match size {
            VmSize::Small => &self.small,
            VmSize::Medium => &self.medium,
            VmSize::Large => &self.large,
        }
    }
}

impl Default for SkuTable {
    fn default() -> Self {
        Self::azure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azure_table() {
        let table = SkuTable::azure();
        assert_eq!(table.sku_for(VmSize::Small), "Standard_DS1_v2");
        assert_eq!(table.sku_for(VmSize::Medium), "Standard_DS2_v2");
        assert_eq!(table.sku_for(VmSize::Large), "Standard_DS3_v2");
    }

    #[test]
    fn test_custom_table_is_total() {
        let table = SkuTable::new("s", "m", "l");
        let skus: Vec<&str> = VmSize::ALL.iter().map(|size| table.sku_for(*size)).collect();
        assert_eq!(skus, vec!["s", "m", "l"]);
    }
}
