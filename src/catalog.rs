//! Component records and the read-only sources that serve them.
//!
//! The pipeline never owns its input. It borrows a slice from a
//! [`ComponentSource`], which is built once at startup and shared behind an
//! `Arc` by every request.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One catalog entry.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Component {
    /// Category label, e.g. `"CPU"`. Serialized as `type`.
    #[serde(rename = "type")]
    pub kind: String,
    pub brand: String,
    pub name: String,
    pub image_url: String,
    pub price: u16,
}

impl Component {
    fn new(kind: &str, brand: &str, name: &str, image_url: &str, price: u16) -> Self {
        Self {
            kind: kind.to_owned(),
            brand: brand.to_owned(),
            name: name.to_owned(),
            image_url: image_url.to_owned(),
            price,
        }
    }
}

/// A read-only supply of components, shared across concurrent requests.
pub trait ComponentSource: Send + Sync + 'static {
    fn components(&self) -> &[Component];
}

/// An immutable, in-memory catalog.
#[derive(Clone, Debug)]
pub struct StaticCatalog {
    components: Vec<Component>,
}

impl StaticCatalog {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// Loads a JSON array of components.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(serde_json::from_slice(&bytes)?))
    }

    /// The twelve-part reference catalog the service ships with.
    pub fn reference() -> Self {
        Self::new(vec![
            Component::new("CPU", "Intel", "Intel Core i9-10900K", "https://static.shop.kz/upload/resize_cache/iblock/481/450_450_1/154212x1.jpg", 500),
            Component::new("GPU", "NVIDIA", "NVIDIA GeForce RTX 3080", "https://www.nvidia.com/content/dam/en-zz/Solutions/geforce/ampere/rtx-3080-3080ti/geforce-rtx-3080-ti-product-gallery-inline-850-2.jpg", 800),
            Component::new("RAM", "Corsair", "Corsair Vengeance RGB Pro 16GB", "https://static.shop.kz/upload/resize_cache/iblock/75f/jnedijtsz335v3d1uo9uzx6605coss0l/450_450_1/171347o4.jpg", 150),
            Component::new("Motherboard", "ASUS", "ASUS ROG Strix Z490-E Gaming", "https://static.shop.kz/upload/resize_cache/iblock/7fa/9ybjfv07nn75rg1o27ux9q7xdo0cw1yv/450_450_1/171994x1.jpg", 300),
            Component::new("Storage", "Samsung", "Samsung 970 EVO Plus 1TB", "https://static.shop.kz/upload/resize_cache/iblock/113/450_450_1/155791_1.jpg", 200),
            Component::new("Power Supply", "EVGA", "EVGA SuperNOVA 850 G5", "https://static.shop.kz/upload/resize_cache/iblock/68a/450_450_1/158510_01.jpg", 150),
            Component::new("CPU", "AMD", "AMD Ryzen 9 5900X", "https://static.shop.kz/upload/resize_cache/iblock/a05/450_450_1/177555n1.jpg", 550),
            Component::new("GPU", "AMD", "AMD Radeon RX 6800 XT", "https://static.shop.kz/upload/resize_cache/iblock/588/450_450_1/183588n1.jpg", 700),
            Component::new("RAM", "G.Skill", "G.Skill Trident Z Neo 32GB", "https://static.shop.kz/upload/resize_cache/iblock/c3e/450_450_1/175271n1.jpg", 250),
            Component::new("Motherboard", "MSI", "MSI MPG X570 Gaming Pro Carbon WiFi", "https://static.shop.kz/upload/resize_cache/iblock/ba3/450_450_1/177844x1.jpg", 280),
            Component::new("Storage", "Western Digital", "WD Black SN750 NVMe SSD 1TB", "https://static.shop.kz/upload/resize_cache/iblock/79a/450_450_1/179287_1.jpg", 180),
            Component::new("Power Supply", "Corsair", "Corsair RM850x 850W", "https://static.shop.kz/upload/resize_cache/iblock/a42/450_450_1/183238x1.jpg", 160),
        ])
    }
}

impl ComponentSource for StaticCatalog {
    fn components(&self) -> &[Component] {
        &self.components
    }
}
