use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{self, CatalogError};
use crate::models::{LlmModel, QuantLevel};

/// Market segment of a hardware entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareCategory {
    NvidiaConsumer,
    NvidiaPro,
    Amd,
    AppleSilicon,
    DedicatedAi,
    MultiGpu,
}

impl HardwareCategory {
    pub const ALL: [HardwareCategory; 6] = [
        HardwareCategory::NvidiaConsumer,
        HardwareCategory::NvidiaPro,
        HardwareCategory::Amd,
        HardwareCategory::AppleSilicon,
        HardwareCategory::DedicatedAi,
        HardwareCategory::MultiGpu,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            HardwareCategory::NvidiaConsumer => "nvidia_consumer",
            HardwareCategory::NvidiaPro => "nvidia_pro",
            HardwareCategory::Amd => "amd",
            HardwareCategory::AppleSilicon => "apple_silicon",
            HardwareCategory::DedicatedAi => "dedicated_ai",
            HardwareCategory::MultiGpu => "multi_gpu",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HardwareCategory::NvidiaConsumer => "NVIDIA コンシューマ",
            HardwareCategory::NvidiaPro => "NVIDIA プロ",
            HardwareCategory::Amd => "AMD",
            HardwareCategory::AppleSilicon => "Apple Silicon",
            HardwareCategory::DedicatedAi => "専用AI機",
            HardwareCategory::MultiGpu => "マルチGPU",
        }
    }

    /// Accepts the snake_case id, with `-` allowed for `_`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|c| c.id() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hardware {
    pub id: String,
    pub name: String,
    pub category: HardwareCategory,
    /// Memory usable by the accelerator, in GB. For unified-memory
    /// machines this is the whole shared pool.
    pub vram_gb: f64,
    pub memory_bandwidth_gbps: f64,
    pub memory_type: String,
    pub tdp_watts: u32,
    pub price_range: String,
    pub multi_gpu_support: bool,
    pub unified_memory: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
}

impl Hardware {
    /// An ad-hoc profile for hardware that isn't in the catalog.
    /// Only VRAM and bandwidth take part in matching; the rest is filler.
    pub fn custom(vram_gb: f64, memory_bandwidth_gbps: f64) -> Self {
        Hardware {
            id: "custom".to_string(),
            name: format!("Custom ({:.1} GB, {:.0} GB/s)", vram_gb, memory_bandwidth_gbps),
            category: HardwareCategory::NvidiaConsumer,
            vram_gb,
            memory_bandwidth_gbps,
            memory_type: "unknown".to_string(),
            tdp_watts: 0,
            price_range: "-".to_string(),
            multi_gpu_support: false,
            unified_memory: false,
            description: String::new(),
            notes: String::new(),
        }
    }
}

/// Parse a human-readable memory size string into gigabytes.
/// Accepts "24", "24G", "24GB", "24GiB", "24576M", "1.5T" and lowercase variants.
/// Returns `None` if the input is malformed.
pub fn parse_memory_size(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (num_str, suffix) = s.split_at(num_end);
    let value: f64 = num_str.parse().ok()?;

    match suffix.trim().to_lowercase().as_str() {
        "" | "g" | "gb" | "gib" => Some(value),
        "m" | "mb" | "mib" => Some(value / 1024.0),
        "t" | "tb" | "tib" => Some(value * 1024.0),
        _ => None,
    }
}

const HARDWARE_JSON: &str = include_str!("../data/hardware.json");

/// Read-only hardware catalog, loaded once at startup.
#[derive(Debug, Clone)]
pub struct HardwareDatabase {
    hardware: Vec<Hardware>,
}

impl HardwareDatabase {
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json_str(HARDWARE_JSON)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = error::read_catalog_file(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let hardware: Vec<Hardware> = serde_json::from_str(json)?;
        Self::from_hardware(hardware)
    }

    pub fn from_hardware(hardware: Vec<Hardware>) -> Result<Self, CatalogError> {
        error::ensure_unique_ids("hardware", hardware.iter().map(|h| h.id.as_str()))?;
        for hw in hardware.iter().filter(|h| h.vram_gb <= 0.0) {
            tracing::warn!(hardware = %hw.id, "catalog data: non-positive VRAM, every model will be difficult");
        }
        tracing::debug!(count = hardware.len(), "loaded hardware catalog");
        Ok(HardwareDatabase { hardware })
    }

    pub fn get_all(&self) -> &[Hardware] {
        &self.hardware
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Hardware> {
        self.hardware.iter().find(|h| h.id == id)
    }

    pub fn by_category(&self, category: HardwareCategory) -> Vec<&Hardware> {
        self.hardware
            .iter()
            .filter(|h| h.category == category)
            .collect()
    }

    /// Hardware that can hold the model at Q4 with an 8K context,
    /// smallest VRAM first.
    pub fn compatible_with(&self, model: &LlmModel) -> Vec<&Hardware> {
        let needed = model.recommended_vram.at_8k(QuantLevel::Q4);
        let mut list: Vec<&Hardware> = self
            .hardware
            .iter()
            .filter(|h| h.vram_gb >= needed)
            .collect();
        list.sort_by(|a, b| {
            a.vram_gb
                .partial_cmp(&b.vram_gb)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        list
    }
}
