use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

use crate::error::{self, CatalogError};
use crate::fit::SortMode;

/// Quantization levels tried when none is pinned, in evaluation order.
/// Earlier levels win ties, so the most compressed format comes first.
pub const QUANT_SEARCH_ORDER: &[QuantLevel] = &[QuantLevel::Q4, QuantLevel::Q8, QuantLevel::Fp16];

/// Precision at which model weights are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantLevel {
    Fp16,
    Q8,
    Q4,
    Q3,
}

impl QuantLevel {
    pub const ALL: [QuantLevel; 4] = [
        QuantLevel::Fp16,
        QuantLevel::Q8,
        QuantLevel::Q4,
        QuantLevel::Q3,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            QuantLevel::Fp16 => "fp16",
            QuantLevel::Q8 => "q8",
            QuantLevel::Q4 => "q4",
            QuantLevel::Q3 => "q3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuantLevel::Fp16 => "FP16",
            QuantLevel::Q8 => "Q8",
            QuantLevel::Q4 => "Q4_K_M",
            QuantLevel::Q3 => "Q3_K_M",
        }
    }

    /// Parse a quant id or its GGUF-style label ("q4", "Q4_K_M", "f16", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fp16" | "f16" | "bf16" => Some(QuantLevel::Fp16),
            "q8" | "q8_0" => Some(QuantLevel::Q8),
            "q4" | "q4_k_m" | "q4_0" => Some(QuantLevel::Q4),
            "q3" | "q3_k_m" => Some(QuantLevel::Q3),
            _ => None,
        }
    }
}

/// Task category tag attached to catalog models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    General,
    Coding,
    Math,
    Reasoning,
    Multilingual,
    Rag,
    Agent,
    Creative,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::General,
        Category::Coding,
        Category::Math,
        Category::Reasoning,
        Category::Multilingual,
        Category::Rag,
        Category::Agent,
        Category::Creative,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Coding => "coding",
            Category::Math => "math",
            Category::Reasoning => "reasoning",
            Category::Multilingual => "multilingual",
            Category::Rag => "rag",
            Category::Agent => "agent",
            Category::Creative => "creative",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::General => "汎用チャット",
            Category::Coding => "コーディング",
            Category::Math => "数学",
            Category::Reasoning => "推論",
            Category::Multilingual => "多言語",
            Category::Rag => "RAG",
            Category::Agent => "エージェント",
            Category::Creative => "クリエイティブ",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.id() == s)
    }
}

/// Quality of Japanese-language output, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JapaneseSupport {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl JapaneseSupport {
    pub fn mark(&self) -> &'static str {
        match self {
            JapaneseSupport::Excellent => "◎",
            JapaneseSupport::Good => "○",
            JapaneseSupport::Fair => "△",
            JapaneseSupport::Poor => "×",
        }
    }

    /// Good enough for everyday Japanese use.
    pub fn is_practical(&self) -> bool {
        matches!(self, JapaneseSupport::Excellent | JapaneseSupport::Good)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Dense,
    Moe,
}

impl Architecture {
    pub fn label(&self) -> &'static str {
        match self {
            Architecture::Dense => "Dense",
            Architecture::Moe => "MoE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "dense" => Some(Architecture::Dense),
            "moe" => Some(Architecture::Moe),
            _ => None,
        }
    }
}

/// Parameter-count bucket used by the size filter.
/// Each bucket excludes its lower bound and includes its upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeRange {
    UpTo3B,
    From3To8B,
    From8To14B,
    From14To32B,
    From32To70B,
    Over70B,
}

impl SizeRange {
    pub const ALL: [SizeRange; 6] = [
        SizeRange::UpTo3B,
        SizeRange::From3To8B,
        SizeRange::From8To14B,
        SizeRange::From14To32B,
        SizeRange::From32To70B,
        SizeRange::Over70B,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SizeRange::UpTo3B => "~3B",
            SizeRange::From3To8B => "3~8B",
            SizeRange::From8To14B => "8~14B",
            SizeRange::From14To32B => "14~32B",
            SizeRange::From32To70B => "32~70B",
            SizeRange::Over70B => "70B~",
        }
    }

    /// Look up a bucket by its label. `-` is accepted in place of `~`
    /// since the tilde is awkward to type in a shell.
    pub fn from_label(s: &str) -> Option<Self> {
        let normalized = s.trim().to_uppercase().replace('-', "~");
        Self::ALL.into_iter().find(|r| r.label() == normalized)
    }

    pub fn contains(&self, params_b: f64) -> bool {
        match self {
            SizeRange::UpTo3B => params_b <= 3.0,
            SizeRange::From3To8B => params_b > 3.0 && params_b <= 8.0,
            SizeRange::From8To14B => params_b > 8.0 && params_b <= 14.0,
            SizeRange::From14To32B => params_b > 14.0 && params_b <= 32.0,
            SizeRange::From32To70B => params_b > 32.0 && params_b <= 70.0,
            SizeRange::Over70B => params_b > 70.0,
        }
    }
}

/// Weight-only VRAM (GB) per quantization level. A missing entry means the
/// model is not distributed at that level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VramRequirements {
    #[serde(default)]
    pub fp16: Option<f64>,
    #[serde(default)]
    pub q8: Option<f64>,
    #[serde(default)]
    pub q4: Option<f64>,
    #[serde(default)]
    pub q3: Option<f64>,
}

impl VramRequirements {
    pub fn get(&self, quant: QuantLevel) -> Option<f64> {
        match quant {
            QuantLevel::Fp16 => self.fp16,
            QuantLevel::Q8 => self.q8,
            QuantLevel::Q4 => self.q4,
            QuantLevel::Q3 => self.q3,
        }
    }

    /// Weight VRAM for thresholding; absent levels never fit.
    pub fn weights_gb(&self, quant: QuantLevel) -> f64 {
        self.get(quant).unwrap_or(f64::INFINITY)
    }

    /// fp16 >= q8 >= q4 >= q3 over the levels that are present.
    pub fn is_monotonic(&self) -> bool {
        let present: Vec<f64> = QuantLevel::ALL
            .iter()
            .filter_map(|&q| self.get(q))
            .collect();
        present.windows(2).all(|w| w[0] >= w[1])
    }
}

/// Recommended total VRAM (weights + KV cache + runtime) at one context size.
/// There is no q3 column; q3 lookups read the q4 figure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextVram {
    #[serde(default)]
    pub q4: Option<f64>,
    #[serde(default)]
    pub q8: Option<f64>,
    #[serde(default)]
    pub fp16: Option<f64>,
}

impl ContextVram {
    pub fn get(&self, quant: QuantLevel) -> Option<f64> {
        match quant {
            QuantLevel::Fp16 => self.fp16,
            QuantLevel::Q8 => self.q8,
            QuantLevel::Q4 | QuantLevel::Q3 => self.q4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendedVram {
    pub context8k: ContextVram,
    pub context32k: ContextVram,
}

impl RecommendedVram {
    /// Recommended VRAM at 8K context; this is the figure tiers are judged on.
    pub fn at_8k(&self, quant: QuantLevel) -> f64 {
        self.context8k.get(quant).unwrap_or(f64::INFINITY)
    }

    pub fn at_32k(&self, quant: QuantLevel) -> f64 {
        self.context32k.get(quant).unwrap_or(f64::INFINITY)
    }

    /// 32K figures are never below their 8K counterparts.
    pub fn is_consistent(&self) -> bool {
        [QuantLevel::Q4, QuantLevel::Q8, QuantLevel::Fp16]
            .into_iter()
            .all(|q| match (self.context8k.get(q), self.context32k.get(q)) {
                (Some(short), Some(long)) => long >= short,
                _ => true,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Benchmark {
    MmluPro,
    HumanEval,
    MathScore,
    Aime,
    LiveCodeBench,
    ArenaHard,
}

impl Benchmark {
    pub const ALL: [Benchmark; 6] = [
        Benchmark::MmluPro,
        Benchmark::HumanEval,
        Benchmark::MathScore,
        Benchmark::Aime,
        Benchmark::LiveCodeBench,
        Benchmark::ArenaHard,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Benchmark::MmluPro => "MMLU-Pro",
            Benchmark::HumanEval => "HumanEval",
            Benchmark::MathScore => "MATH",
            Benchmark::Aime => "AIME",
            Benchmark::LiveCodeBench => "LiveCodeBench",
            Benchmark::ArenaHard => "Arena Hard",
        }
    }
}

/// Published benchmark scores as fractions in [0, 1]. Any subset may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Benchmarks {
    #[serde(default)]
    pub mmlu_pro: Option<f64>,
    #[serde(default)]
    pub human_eval: Option<f64>,
    #[serde(default)]
    pub math_score: Option<f64>,
    #[serde(default)]
    pub aime: Option<f64>,
    #[serde(default)]
    pub live_code_bench: Option<f64>,
    #[serde(default)]
    pub arena_hard: Option<f64>,
}

impl Benchmarks {
    pub fn get(&self, benchmark: Benchmark) -> Option<f64> {
        match benchmark {
            Benchmark::MmluPro => self.mmlu_pro,
            Benchmark::HumanEval => self.human_eval,
            Benchmark::MathScore => self.math_score,
            Benchmark::Aime => self.aime,
            Benchmark::LiveCodeBench => self.live_code_bench,
            Benchmark::ArenaHard => self.arena_hard,
        }
    }

    /// Present scores only, in display order.
    pub fn entries(&self) -> Vec<(Benchmark, f64)> {
        Benchmark::ALL
            .into_iter()
            .filter_map(|b| self.get(b).map(|score| (b, score)))
            .collect()
    }
}

/// Editorial star ratings, 0-5.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub overall: u8,
    pub coding: u8,
    pub reasoning: u8,
    pub creative: u8,
    pub multilingual: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickStart {
    #[serde(default)]
    pub ollama: Option<String>,
    #[serde(default)]
    pub llama_cpp: Option<String>,
    #[serde(default)]
    pub vllm: Option<String>,
}

impl QuickStart {
    /// (engine name, command) pairs for the engines that have one.
    pub fn commands(&self) -> Vec<(&'static str, &str)> {
        [
            ("Ollama", self.ollama.as_deref()),
            ("llama.cpp", self.llama_cpp.as_deref()),
            ("vLLM", self.vllm.as_deref()),
        ]
        .into_iter()
        .filter_map(|(engine, cmd)| cmd.map(|c| (engine, c)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmModel {
    pub id: String,
    pub name: String,
    pub family: String,
    pub developer: String,
    /// Total parameters, in billions.
    pub parameter_count: f64,
    /// Parameters active per token (MoE only), in billions.
    #[serde(default)]
    pub active_parameters: Option<f64>,
    pub architecture: Architecture,
    pub context_length: u32,
    pub license: String,
    pub commercial_use: bool,
    pub release_date: String,
    pub categories: Vec<Category>,
    pub japanese_support: JapaneseSupport,
    pub vram_requirements: VramRequirements,
    pub recommended_vram: RecommendedVram,
    #[serde(default)]
    pub benchmarks: Benchmarks,
    pub ratings: Ratings,
    #[serde(default)]
    pub quick_start: QuickStart,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
}

impl LlmModel {
    pub fn is_moe(&self) -> bool {
        self.architecture == Architecture::Moe
    }

    pub fn has_any_category(&self, wanted: &[Category]) -> bool {
        wanted.iter().any(|c| self.categories.contains(c))
    }

    /// "32B" or "30.5B (active 3.3B)" for MoE models.
    pub fn param_label(&self) -> String {
        match self.active_parameters {
            Some(active) => format!("{}B (active {}B)", self.parameter_count, active),
            None => format!("{}B", self.parameter_count),
        }
    }

    /// Catalog data problems worth a warning. The engine tolerates them.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.vram_requirements.is_monotonic() {
            problems.push("weight VRAM increases as precision decreases".to_string());
        }
        if !self.recommended_vram.is_consistent() {
            problems.push("32K recommended VRAM is below the 8K figure".to_string());
        }
        if self.ratings.overall > 5 {
            problems.push(format!("overall rating {} exceeds 5", self.ratings.overall));
        }
        problems
    }
}

/// Options for browsing the catalog without matching against hardware.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub size_range: Option<SizeRange>,
    pub sort: SortMode,
}

const MODELS_JSON: &str = include_str!("../data/models.json");

/// Read-only model catalog, loaded once at startup.
#[derive(Debug, Clone)]
pub struct ModelDatabase {
    models: Vec<LlmModel>,
}

impl ModelDatabase {
    /// The catalog compiled into the binary.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json_str(MODELS_JSON)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = error::read_catalog_file(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let models: Vec<LlmModel> = serde_json::from_str(json)?;
        Self::from_models(models)
    }

    pub fn from_models(models: Vec<LlmModel>) -> Result<Self, CatalogError> {
        error::ensure_unique_ids("model", models.iter().map(|m| m.id.as_str()))?;
        for model in &models {
            for problem in model.invariant_violations() {
                tracing::warn!(model = %model.id, "catalog data: {}", problem);
            }
        }
        tracing::debug!(count = models.len(), "loaded model catalog");
        Ok(ModelDatabase { models })
    }

    pub fn get_all_models(&self) -> &[LlmModel] {
        &self.models
    }

    pub fn find_by_id(&self, id: &str) -> Option<&LlmModel> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Case-insensitive substring search over name, family and developer.
    pub fn search(&self, query: &str) -> Vec<&LlmModel> {
        let query_lower = query.to_lowercase();
        self.models
            .iter()
            .filter(|m| {
                m.name.to_lowercase().contains(&query_lower)
                    || m.family.to_lowercase().contains(&query_lower)
                    || m.developer.to_lowercase().contains(&query_lower)
            })
            .collect()
    }

    /// Filter and sort the catalog for listing. `SortMode::Recommended`
    /// orders by overall rating here, since there is no engine ranking.
    pub fn browse(&self, query: &CatalogQuery) -> Vec<&LlmModel> {
        let mut list: Vec<&LlmModel> = match query.search.as_deref() {
            Some(q) if !q.trim().is_empty() => self.search(q.trim()),
            _ => self.models.iter().collect(),
        };

        if let Some(category) = query.category {
            list.retain(|m| m.categories.contains(&category));
        }
        if let Some(range) = query.size_range {
            list.retain(|m| range.contains(m.parameter_count));
        }

        match query.sort {
            SortMode::Recommended => {
                list.sort_by(|a, b| b.ratings.overall.cmp(&a.ratings.overall))
            }
            SortMode::Benchmark => list.sort_by(|a, b| {
                let a_score = a.benchmarks.mmlu_pro.unwrap_or(0.0);
                let b_score = b.benchmarks.mmlu_pro.unwrap_or(0.0);
                b_score.partial_cmp(&a_score).unwrap_or(Ordering::Equal)
            }),
            SortMode::VramEfficiency => list.sort_by(|a, b| {
                let a_eff = a.ratings.overall as f64 / a.recommended_vram.at_8k(QuantLevel::Q4);
                let b_eff = b.ratings.overall as f64 / b.recommended_vram.at_8k(QuantLevel::Q4);
                b_eff.partial_cmp(&a_eff).unwrap_or(Ordering::Equal)
            }),
            SortMode::ReleaseDate => list.sort_by(|a, b| b.release_date.cmp(&a.release_date)),
            SortMode::ParamAsc => list.sort_by(|a, b| {
                a.parameter_count
                    .partial_cmp(&b.parameter_count)
                    .unwrap_or(Ordering::Equal)
            }),
            SortMode::ParamDesc => list.sort_by(|a, b| {
                b.parameter_count
                    .partial_cmp(&a.parameter_count)
                    .unwrap_or(Ordering::Equal)
            }),
        }
        list
    }
}
