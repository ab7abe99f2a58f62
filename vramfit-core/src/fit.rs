use std::cmp::Ordering;

use crate::hardware::Hardware;
use crate::models::{Architecture, Category, LlmModel, QUANT_SEARCH_ORDER, QuantLevel, SizeRange};

/// Share of VRAM a model may use and still count as comfortable.
/// The rest is left for the OS, display and runtime buffers.
pub const COMFORTABLE_HEADROOM: f64 = 0.85;

/// Coarse fit classification, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Comfortable, // within 85% of VRAM
    Possible,    // fits, but with little headroom
    Difficult,   // exceeds VRAM
}

impl MatchTier {
    pub const ALL: [MatchTier; 3] = [
        MatchTier::Comfortable,
        MatchTier::Possible,
        MatchTier::Difficult,
    ];

    pub fn rank(&self) -> u8 {
        match self {
            MatchTier::Comfortable => 0,
            MatchTier::Possible => 1,
            MatchTier::Difficult => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchTier::Comfortable => "Comfortable",
            MatchTier::Possible => "Possible",
            MatchTier::Difficult => "Difficult",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            MatchTier::Comfortable => "🟢",
            MatchTier::Possible => "🟡",
            MatchTier::Difficult => "🔴",
        }
    }
}

/// How much context the hardware can hold at the chosen quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ContextFit {
    #[serde(rename = "32K+")]
    Extended,
    #[serde(rename = "~32K")]
    Around32k,
    #[serde(rename = "~8K")]
    Around8k,
    /// Context has to stay below 8K.
    #[serde(rename = "制限あり")]
    Limited,
}

impl ContextFit {
    pub fn label(&self) -> &'static str {
        match self {
            ContextFit::Extended => "32K+",
            ContextFit::Around32k => "~32K",
            ContextFit::Around8k => "~8K",
            ContextFit::Limited => "制限あり",
        }
    }
}

/// Rough generation-speed bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SpeedClass {
    #[serde(rename = "CPUオフロード必要 (1-5 t/s)")]
    CpuOffload,
    #[serde(rename = "高速 (50-100+ t/s)")]
    VeryFast,
    #[serde(rename = "快速 (30-60 t/s)")]
    Fast,
    #[serde(rename = "標準 (15-35 t/s)")]
    Standard,
    #[serde(rename = "低速 (5-15 t/s)")]
    Slow,
}

impl SpeedClass {
    /// Bucket for a model whose weights fit in VRAM. Decoding is
    /// memory-bound, so bandwidth alone decides.
    pub fn from_bandwidth(memory_bandwidth_gbps: f64) -> Self {
        if memory_bandwidth_gbps >= 1000.0 {
            SpeedClass::VeryFast
        } else if memory_bandwidth_gbps >= 500.0 {
            SpeedClass::Fast
        } else if memory_bandwidth_gbps >= 250.0 {
            SpeedClass::Standard
        } else {
            SpeedClass::Slow
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpeedClass::CpuOffload => "CPUオフロード必要 (1-5 t/s)",
            SpeedClass::VeryFast => "高速 (50-100+ t/s)",
            SpeedClass::Fast => "快速 (30-60 t/s)",
            SpeedClass::Standard => "標準 (15-35 t/s)",
            SpeedClass::Slow => "低速 (5-15 t/s)",
        }
    }
}

/// Optional constraints on which models are matched. Every field left at
/// its default means "no constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchFilters {
    /// Keep models sharing at least one of these tags.
    pub categories: Vec<Category>,
    pub size_range: Option<SizeRange>,
    pub commercial_only: bool,
    /// Keep only models with good or excellent Japanese.
    pub japanese_only: bool,
    /// Evaluate only this quantization instead of searching.
    pub quant_level: Option<QuantLevel>,
    pub architecture: Option<Architecture>,
}

impl MatchFilters {
    pub fn admits(&self, model: &LlmModel) -> bool {
        if !self.categories.is_empty() && !model.has_any_category(&self.categories) {
            return false;
        }
        if let Some(range) = self.size_range {
            if !range.contains(model.parameter_count) {
                return false;
            }
        }
        if self.commercial_only && !model.commercial_use {
            return false;
        }
        if self.japanese_only && !model.japanese_support.is_practical() {
            return false;
        }
        if let Some(arch) = self.architecture {
            if model.architecture != arch {
                return false;
            }
        }
        true
    }

    fn quant_candidates(&self) -> &[QuantLevel] {
        match &self.quant_level {
            Some(pinned) => std::slice::from_ref(pinned),
            None => QUANT_SEARCH_ORDER,
        }
    }
}

/// One model evaluated against one piece of hardware. Built fresh per query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult<'a> {
    pub model: &'a LlmModel,
    pub hardware: &'a Hardware,
    pub tier: MatchTier,
    pub quant_level: QuantLevel,
    /// 8K-context recommended VRAM at `quant_level`, in GB.
    pub required_vram: f64,
    pub available_vram: f64,
    pub max_context: ContextFit,
    pub estimated_speed: SpeedClass,
}

impl MatchResult<'_> {
    /// Overall stars per GB of required VRAM.
    pub fn vram_efficiency(&self) -> f64 {
        self.model.ratings.overall as f64 / self.required_vram
    }

    pub fn utilization_pct(&self) -> f64 {
        if self.available_vram > 0.0 {
            self.required_vram / self.available_vram * 100.0
        } else {
            f64::INFINITY
        }
    }
}

/// Classify required vs available VRAM.
pub fn determine_tier(required_vram: f64, available_vram: f64) -> MatchTier {
    if available_vram <= 0.0 {
        return MatchTier::Difficult;
    }
    if required_vram <= available_vram * COMFORTABLE_HEADROOM {
        MatchTier::Comfortable
    } else if required_vram <= available_vram {
        MatchTier::Possible
    } else {
        MatchTier::Difficult
    }
}

fn max_context(model: &LlmModel, quant: QuantLevel, available_vram: f64) -> ContextFit {
    let vram_8k = model.recommended_vram.at_8k(quant);
    let vram_32k = model.recommended_vram.at_32k(quant);

    if vram_32k <= available_vram * COMFORTABLE_HEADROOM {
        ContextFit::Extended
    } else if vram_32k <= available_vram {
        ContextFit::Around32k
    } else if vram_8k <= available_vram {
        ContextFit::Around8k
    } else {
        ContextFit::Limited
    }
}

fn estimate_speed(hardware: &Hardware, model: &LlmModel, quant: QuantLevel) -> SpeedClass {
    // Weight-only figure, with no q3 -> q4 fallback: a model without q3
    // weights is treated as not fitting at q3.
    if model.vram_requirements.weights_gb(quant) > hardware.vram_gb {
        return SpeedClass::CpuOffload;
    }
    SpeedClass::from_bandwidth(hardware.memory_bandwidth_gbps)
}

/// Try each candidate quantization and keep the first one reaching the best
/// tier. A later level only replaces the current pick on a strict improvement.
fn best_match<'a>(
    hardware: &'a Hardware,
    model: &'a LlmModel,
    quants: &[QuantLevel],
) -> Option<MatchResult<'a>> {
    let mut best: Option<MatchResult<'a>> = None;

    for &quant in quants {
        let required_vram = model.recommended_vram.at_8k(quant);
        let tier = determine_tier(required_vram, hardware.vram_gb);

        let improves = best
            .as_ref()
            .is_none_or(|current| tier.rank() < current.tier.rank());
        if improves {
            best = Some(MatchResult {
                model,
                hardware,
                tier,
                quant_level: quant,
                required_vram,
                available_vram: hardware.vram_gb,
                max_context: max_context(model, quant, hardware.vram_gb),
                estimated_speed: estimate_speed(hardware, model, quant),
            });
        }
    }

    best
}

/// Match every model that passes `filters` against `hardware`.
///
/// Each surviving model yields exactly one result at its best quantization.
/// Results are ordered by tier, then overall rating (high first), then
/// parameter count (large first); ties keep catalog order.
pub fn match_models<'a>(
    hardware: &'a Hardware,
    models: &'a [LlmModel],
    filters: &MatchFilters,
) -> Vec<MatchResult<'a>> {
    let quants = filters.quant_candidates();

    let mut results: Vec<MatchResult<'a>> = models
        .iter()
        .filter(|m| filters.admits(m))
        .filter_map(|m| best_match(hardware, m, quants))
        .collect();

    rank_matches(&mut results);

    tracing::debug!(
        hardware = %hardware.id,
        candidates = models.len(),
        matched = results.len(),
        "matched models against hardware"
    );
    results
}

/// Default engine ordering. Stable.
pub fn rank_matches(results: &mut [MatchResult<'_>]) {
    results.sort_by(|a, b| {
        a.tier
            .rank()
            .cmp(&b.tier.rank())
            .then_with(|| b.model.ratings.overall.cmp(&a.model.ratings.overall))
            .then_with(|| {
                b.model
                    .parameter_count
                    .partial_cmp(&a.model.parameter_count)
                    .unwrap_or(Ordering::Equal)
            })
    });
}

/// Alternate orderings offered on top of the engine ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Keep the engine ranking.
    #[default]
    Recommended,
    /// MMLU-Pro, highest first; models without a score sort as 0.
    Benchmark,
    /// Overall stars per GB of required VRAM.
    VramEfficiency,
    /// Newest first.
    ReleaseDate,
    ParamAsc,
    ParamDesc,
}

impl SortMode {
    pub const ALL: [SortMode; 6] = [
        SortMode::Recommended,
        SortMode::Benchmark,
        SortMode::VramEfficiency,
        SortMode::ReleaseDate,
        SortMode::ParamAsc,
        SortMode::ParamDesc,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            SortMode::Recommended => "recommended",
            SortMode::Benchmark => "benchmark",
            SortMode::VramEfficiency => "vram_efficiency",
            SortMode::ReleaseDate => "release_date",
            SortMode::ParamAsc => "param_asc",
            SortMode::ParamDesc => "param_desc",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SortMode::Recommended => "Recommended",
            SortMode::Benchmark => "Benchmark",
            SortMode::VramEfficiency => "VRAM efficiency",
            SortMode::ReleaseDate => "Release date",
            SortMode::ParamAsc => "Params (small first)",
            SortMode::ParamDesc => "Params (large first)",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|m| m.id() == s)
    }
}

/// Re-sort engine output. Stable, so equal keys keep the engine ranking.
pub fn sort_matches(mut results: Vec<MatchResult<'_>>, mode: SortMode) -> Vec<MatchResult<'_>> {
    match mode {
        SortMode::Recommended => {}
        SortMode::Benchmark => results.sort_by(|a, b| {
            let a_score = a.model.benchmarks.mmlu_pro.unwrap_or(0.0);
            let b_score = b.model.benchmarks.mmlu_pro.unwrap_or(0.0);
            b_score.partial_cmp(&a_score).unwrap_or(Ordering::Equal)
        }),
        SortMode::VramEfficiency => results.sort_by(|a, b| {
            b.vram_efficiency()
                .partial_cmp(&a.vram_efficiency())
                .unwrap_or(Ordering::Equal)
        }),
        SortMode::ReleaseDate => {
            results.sort_by(|a, b| b.model.release_date.cmp(&a.model.release_date))
        }
        SortMode::ParamAsc => results.sort_by(|a, b| {
            a.model
                .parameter_count
                .partial_cmp(&b.model.parameter_count)
                .unwrap_or(Ordering::Equal)
        }),
        SortMode::ParamDesc => results.sort_by(|a, b| {
            b.model
                .parameter_count
                .partial_cmp(&a.model.parameter_count)
                .unwrap_or(Ordering::Equal)
        }),
    }
    results
}

/// Results split by tier, order within each tier preserved.
#[derive(Debug, Clone, Default)]
pub struct TierGroups<'a> {
    pub comfortable: Vec<MatchResult<'a>>,
    pub possible: Vec<MatchResult<'a>>,
    pub difficult: Vec<MatchResult<'a>>,
}

impl<'a> TierGroups<'a> {
    pub fn from_matches(results: &[MatchResult<'a>]) -> Self {
        let mut groups = TierGroups::default();
        for result in results {
            match result.tier {
                MatchTier::Comfortable => groups.comfortable.push(*result),
                MatchTier::Possible => groups.possible.push(*result),
                MatchTier::Difficult => groups.difficult.push(*result),
            }
        }
        groups
    }

    pub fn get(&self, tier: MatchTier) -> &[MatchResult<'a>] {
        match tier {
            MatchTier::Comfortable => &self.comfortable,
            MatchTier::Possible => &self.possible,
            MatchTier::Difficult => &self.difficult,
        }
    }

    /// Models that run at all (comfortable + possible).
    pub fn runnable_count(&self) -> usize {
        self.comfortable.len() + self.possible.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Benchmarks, ContextVram, JapaneseSupport, QuickStart, Ratings, RecommendedVram,
        VramRequirements,
    };

    // ────────────────────────────────────────────────────────────────────
    // Fixtures
    // ────────────────────────────────────────────────────────────────────

    /// A dense model whose 8K recommended VRAM is `q4_8k` at Q4, roughly
    /// 1.7x that at Q8 and 3.2x at FP16. 32K needs 4 GB more.
    fn test_model(id: &str, params: f64, q4_8k: f64) -> LlmModel {
        let q8_8k = q4_8k * 1.7;
        let fp16_8k = q4_8k * 3.2;
        LlmModel {
            id: id.to_string(),
            name: format!("Test {}", id),
            family: "Test".to_string(),
            developer: "Test Lab".to_string(),
            parameter_count: params,
            active_parameters: None,
            architecture: Architecture::Dense,
            context_length: 32768,
            license: "Apache 2.0".to_string(),
            commercial_use: true,
            release_date: "2025-01-01".to_string(),
            categories: vec![Category::General],
            japanese_support: JapaneseSupport::Good,
            vram_requirements: VramRequirements {
                fp16: Some(fp16_8k - 2.0),
                q8: Some(q8_8k - 2.0),
                q4: Some(q4_8k - 2.0),
                q3: None,
            },
            recommended_vram: RecommendedVram {
                context8k: ContextVram {
                    q4: Some(q4_8k),
                    q8: Some(q8_8k),
                    fp16: Some(fp16_8k),
                },
                context32k: ContextVram {
                    q4: Some(q4_8k + 4.0),
                    q8: Some(q8_8k + 4.0),
                    fp16: Some(fp16_8k + 4.0),
                },
            },
            benchmarks: Benchmarks::default(),
            ratings: Ratings {
                overall: 3,
                ..Ratings::default()
            },
            quick_start: QuickStart::default(),
            description: String::new(),
            notes: String::new(),
        }
    }

    /// A model that needs `vram` GB at every quantization and context.
    fn flat_model(id: &str, vram: f64) -> LlmModel {
        let ctx = ContextVram {
            q4: Some(vram),
            q8: Some(vram),
            fp16: Some(vram),
        };
        LlmModel {
            vram_requirements: VramRequirements {
                fp16: Some(vram),
                q8: Some(vram),
                q4: Some(vram),
                q3: None,
            },
            recommended_vram: RecommendedVram {
                context8k: ctx.clone(),
                context32k: ctx,
            },
            ..test_model(id, 20.0, vram)
        }
    }

    fn test_hardware(vram: f64, bandwidth: f64) -> Hardware {
        Hardware::custom(vram, bandwidth)
    }

    fn ids<'m>(results: &[MatchResult<'m>]) -> Vec<&'m str> {
        results.iter().map(|r| r.model.id.as_str()).collect()
    }

    // ────────────────────────────────────────────────────────────────────
    // determine_tier
    // ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(determine_tier(16.0, 24.0), MatchTier::Comfortable);
        assert_eq!(determine_tier(20.0, 24.0), MatchTier::Comfortable);
        assert_eq!(determine_tier(20.5, 24.0), MatchTier::Possible);
        assert_eq!(determine_tier(24.0, 24.0), MatchTier::Possible);
        assert_eq!(determine_tier(24.1, 24.0), MatchTier::Difficult);
    }

    #[test]
    fn test_tier_infinite_requirement_is_difficult() {
        assert_eq!(determine_tier(f64::INFINITY, 512.0), MatchTier::Difficult);
        assert_eq!(determine_tier(f64::NAN, 24.0), MatchTier::Difficult);
    }

    #[test]
    fn test_tier_non_positive_vram_is_difficult() {
        assert_eq!(determine_tier(0.0, 0.0), MatchTier::Difficult);
        assert_eq!(determine_tier(4.0, -8.0), MatchTier::Difficult);
    }

    #[test]
    fn test_tier_consistency_sweep() {
        let available = 16.0;
        for step in 0..=400 {
            let required = step as f64 * 0.1;
            let tier = determine_tier(required, available);
            let expected = if required <= available * COMFORTABLE_HEADROOM {
                MatchTier::Comfortable
            } else if required <= available {
                MatchTier::Possible
            } else {
                MatchTier::Difficult
            };
            assert_eq!(tier, expected, "required = {required}");
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // End-to-end scenarios
    // ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_comfortable_scenario() {
        let hw = test_hardware(24.0, 1000.0);
        let mut model = test_model("a", 32.0, 16.0);
        model.recommended_vram.context32k.q4 = Some(20.0);
        model.ratings.overall = 5;
        let models = vec![model];

        let results = match_models(&hw, &models, &MatchFilters::default());

        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.tier, MatchTier::Comfortable);
        assert_eq!(r.quant_level, QuantLevel::Q4);
        assert_eq!(r.required_vram, 16.0);
        assert_eq!(r.available_vram, 24.0);
        assert_eq!(r.max_context, ContextFit::Extended);
        assert_eq!(r.estimated_speed, SpeedClass::VeryFast);
    }

    #[test]
    fn test_boundary_scenario_is_possible() {
        let hw = test_hardware(16.0, 500.0);
        let models = vec![test_model("b", 14.0, 16.0)];

        let results = match_models(&hw, &models, &MatchFilters::default());

        assert_eq!(results[0].tier, MatchTier::Possible);
        assert_eq!(results[0].quant_level, QuantLevel::Q4);
        assert_eq!(results[0].max_context, ContextFit::Around8k);
    }

    #[test]
    fn test_difficult_scenario_picks_first_quant() {
        let hw = test_hardware(8.0, 272.0);
        let models = vec![flat_model("c", 20.0)];

        let results = match_models(&hw, &models, &MatchFilters::default());

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tier, MatchTier::Difficult);
        assert_eq!(results[0].quant_level, QuantLevel::Q4);
        assert_eq!(results[0].max_context, ContextFit::Limited);
        assert_eq!(results[0].estimated_speed, SpeedClass::CpuOffload);
    }

    // ────────────────────────────────────────────────────────────────────
    // Quantization selection
    // ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_q4_preferred_on_tie() {
        let hw = test_hardware(80.0, 2000.0);
        let models = vec![test_model("small", 4.0, 4.0)];

        let results = match_models(&hw, &models, &MatchFilters::default());

        // Every level is comfortable; the first evaluated wins.
        assert_eq!(results[0].tier, MatchTier::Comfortable);
        assert_eq!(results[0].quant_level, QuantLevel::Q4);
    }

    #[test]
    fn test_later_quant_replaces_on_strict_improvement() {
        // Odd data where Q8 needs less than Q4; Q8 must win.
        let hw = test_hardware(24.0, 1000.0);
        let mut model = test_model("odd", 8.0, 23.0);
        model.recommended_vram.context8k.q8 = Some(10.0);
        let models = vec![model];

        let results = match_models(&hw, &models, &MatchFilters::default());

        assert_eq!(results[0].tier, MatchTier::Comfortable);
        assert_eq!(results[0].quant_level, QuantLevel::Q8);
        assert_eq!(results[0].required_vram, 10.0);
    }

    #[test]
    fn test_best_tier_is_never_beaten_by_another_quant() {
        let models: Vec<LlmModel> = (1..=30)
            .map(|i| test_model(&format!("m{i}"), i as f64 * 2.0, i as f64 * 1.5))
            .collect();
        for vram in [6.0, 8.0, 12.0, 16.0, 24.0, 48.0] {
            let hw = test_hardware(vram, 500.0);
            for r in match_models(&hw, &models, &MatchFilters::default()) {
                for &q in QUANT_SEARCH_ORDER {
                    let alt = determine_tier(r.model.recommended_vram.at_8k(q), vram);
                    assert!(alt.rank() >= r.tier.rank());
                }
            }
        }
    }

    #[test]
    fn test_pinned_quant_is_the_only_level_tried() {
        let hw = test_hardware(24.0, 1000.0);
        let models = vec![test_model("a", 8.0, 6.0)];
        let filters = MatchFilters {
            quant_level: Some(QuantLevel::Fp16),
            ..MatchFilters::default()
        };

        let results = match_models(&hw, &models, &filters);

        assert_eq!(results[0].quant_level, QuantLevel::Fp16);
        assert_eq!(results[0].required_vram, 6.0 * 3.2);
    }

    #[test]
    fn test_pinned_q3_uses_q4_recommendation_but_not_q4_weights() {
        let hw = test_hardware(24.0, 1000.0);
        let models = vec![test_model("no-q3", 8.0, 6.0)];
        let filters = MatchFilters {
            quant_level: Some(QuantLevel::Q3),
            ..MatchFilters::default()
        };

        let results = match_models(&hw, &models, &filters);

        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.quant_level, QuantLevel::Q3);
        // Recommended VRAM falls back to the Q4 column.
        assert_eq!(r.required_vram, 6.0);
        assert_eq!(r.tier, MatchTier::Comfortable);
        // Weight VRAM has no fallback, so speed reports offload.
        assert_eq!(r.estimated_speed, SpeedClass::CpuOffload);
    }

    #[test]
    fn test_missing_recommendation_makes_model_difficult() {
        let hw = test_hardware(24.0, 1000.0);
        let mut model = test_model("sparse", 8.0, 6.0);
        model.recommended_vram.context8k = ContextVram::default();
        model.recommended_vram.context32k = ContextVram::default();
        let models = vec![model];
        let filters = MatchFilters {
            quant_level: Some(QuantLevel::Q3),
            ..MatchFilters::default()
        };

        let results = match_models(&hw, &models, &filters);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tier, MatchTier::Difficult);
        assert!(results[0].required_vram.is_infinite());
        assert_eq!(results[0].max_context, ContextFit::Limited);
    }

    // ────────────────────────────────────────────────────────────────────
    // Context and speed labels
    // ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_max_context_levels() {
        let mut model = test_model("ctx", 8.0, 8.0);
        model.recommended_vram.context32k.q4 = Some(14.0);

        assert_eq!(max_context(&model, QuantLevel::Q4, 20.0), ContextFit::Extended);
        assert_eq!(max_context(&model, QuantLevel::Q4, 15.0), ContextFit::Around32k);
        assert_eq!(max_context(&model, QuantLevel::Q4, 10.0), ContextFit::Around8k);
        assert_eq!(max_context(&model, QuantLevel::Q4, 6.0), ContextFit::Limited);
    }

    #[test]
    fn test_speed_buckets() {
        assert_eq!(SpeedClass::from_bandwidth(1792.0), SpeedClass::VeryFast);
        assert_eq!(SpeedClass::from_bandwidth(1000.0), SpeedClass::VeryFast);
        assert_eq!(SpeedClass::from_bandwidth(999.0), SpeedClass::Fast);
        assert_eq!(SpeedClass::from_bandwidth(500.0), SpeedClass::Fast);
        assert_eq!(SpeedClass::from_bandwidth(250.0), SpeedClass::Standard);
        assert_eq!(SpeedClass::from_bandwidth(120.0), SpeedClass::Slow);
    }

    #[test]
    fn test_speed_offload_when_weights_exceed_vram() {
        let hw = test_hardware(8.0, 1000.0);
        let model = test_model("big", 14.0, 12.0); // 10 GB of Q4 weights
        assert_eq!(estimate_speed(&hw, &model, QuantLevel::Q4), SpeedClass::CpuOffload);

        let roomy = test_hardware(16.0, 1000.0);
        assert_eq!(estimate_speed(&roomy, &model, QuantLevel::Q4), SpeedClass::VeryFast);
    }

    #[test]
    fn test_labels_serialize_as_display_text() {
        assert_eq!(
            serde_json::to_value(ContextFit::Limited).unwrap(),
            serde_json::json!("制限あり")
        );
        assert_eq!(
            serde_json::to_value(SpeedClass::Standard).unwrap(),
            serde_json::json!(SpeedClass::Standard.label())
        );
        assert_eq!(
            serde_json::to_value(MatchTier::Possible).unwrap(),
            serde_json::json!("possible")
        );
    }

    // ────────────────────────────────────────────────────────────────────
    // Filters
    // ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_category_filter_uses_or_semantics() {
        let hw = test_hardware(24.0, 1000.0);
        let mut coder = test_model("coder", 8.0, 6.0);
        coder.categories = vec![Category::Coding, Category::Agent];
        let mut mathy = test_model("mathy", 8.0, 6.0);
        mathy.categories = vec![Category::Math];
        let general = test_model("general", 8.0, 6.0);
        let models = vec![coder, mathy, general];

        let filters = MatchFilters {
            categories: vec![Category::Agent, Category::Math],
            ..MatchFilters::default()
        };
        let mut got = ids(&match_models(&hw, &models, &filters));
        got.sort();
        assert_eq!(got, vec!["coder", "mathy"]);

        let everything = match_models(&hw, &models, &MatchFilters::default());
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn test_size_range_filter_boundaries() {
        let hw = test_hardware(512.0, 800.0);
        let models = vec![test_model("eight", 8.0, 6.0), test_model("seventy", 70.0, 45.0)];

        let in_bucket = |range: SizeRange| {
            let filters = MatchFilters {
                size_range: Some(range),
                ..MatchFilters::default()
            };
            ids(&match_models(&hw, &models, &filters))
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        };

        assert_eq!(in_bucket(SizeRange::From3To8B), vec!["eight"]);
        assert!(in_bucket(SizeRange::From8To14B).is_empty());
        assert_eq!(in_bucket(SizeRange::From32To70B), vec!["seventy"]);
        assert!(in_bucket(SizeRange::Over70B).is_empty());
    }

    #[test]
    fn test_commercial_japanese_and_architecture_filters() {
        let hw = test_hardware(24.0, 1000.0);
        let mut research = test_model("research", 8.0, 6.0);
        research.commercial_use = false;
        let mut english = test_model("english", 8.0, 6.0);
        english.japanese_support = JapaneseSupport::Fair;
        let mut moe = test_model("moe", 30.0, 20.0);
        moe.architecture = Architecture::Moe;
        moe.japanese_support = JapaneseSupport::Excellent;
        let models = vec![research, english, moe];

        let commercial = MatchFilters {
            commercial_only: true,
            ..MatchFilters::default()
        };
        assert!(!ids(&match_models(&hw, &models, &commercial)).contains(&"research"));

        let japanese = MatchFilters {
            japanese_only: true,
            ..MatchFilters::default()
        };
        let got = ids(&match_models(&hw, &models, &japanese));
        assert!(!got.contains(&"english"));
        assert!(got.contains(&"research"));

        let moe_only = MatchFilters {
            architecture: Some(Architecture::Moe),
            ..MatchFilters::default()
        };
        assert_eq!(ids(&match_models(&hw, &models, &moe_only)), vec!["moe"]);
    }

    // ────────────────────────────────────────────────────────────────────
    // Ordering
    // ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_ordering_tier_then_rating_then_params() {
        let hw = test_hardware(16.0, 500.0);
        let mut difficult_star = flat_model("difficult-star", 40.0);
        difficult_star.ratings.overall = 5;
        let mut possible = test_model("possible", 14.0, 15.0);
        possible.ratings.overall = 5;
        let mut comfy_low = test_model("comfy-low", 8.0, 6.0);
        comfy_low.ratings.overall = 3;
        let mut comfy_small = test_model("comfy-small", 4.0, 4.0);
        comfy_small.ratings.overall = 4;
        let mut comfy_big = test_model("comfy-big", 12.0, 10.0);
        comfy_big.ratings.overall = 4;
        let models = vec![difficult_star, possible, comfy_low, comfy_small, comfy_big];

        let results = match_models(&hw, &models, &MatchFilters::default());

        assert_eq!(
            ids(&results),
            vec!["comfy-big", "comfy-small", "comfy-low", "possible", "difficult-star"]
        );
    }

    #[test]
    fn test_equal_keys_keep_input_order() {
        let hw = test_hardware(24.0, 1000.0);
        let models = vec![test_model("first", 8.0, 6.0), test_model("second", 8.0, 6.0)];
        let results = match_models(&hw, &models, &MatchFilters::default());
        assert_eq!(ids(&results), vec!["first", "second"]);
    }

    #[test]
    fn test_idempotent() {
        let hw = test_hardware(16.0, 448.0);
        let models: Vec<LlmModel> = (1..=12)
            .map(|i| test_model(&format!("m{i}"), i as f64 * 3.0, i as f64 * 2.0))
            .collect();
        let copy = models.clone();

        let first = match_models(&hw, &models, &MatchFilters::default());
        let second = match_models(&hw, &copy, &MatchFilters::default());

        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_catalog() {
        let hw = test_hardware(24.0, 1000.0);
        assert!(match_models(&hw, &[], &MatchFilters::default()).is_empty());
    }

    #[test]
    fn test_zero_vram_hardware() {
        let hw = test_hardware(0.0, 0.0);
        let models = vec![test_model("a", 1.0, 1.0), test_model("b", 8.0, 6.0)];
        let results = match_models(&hw, &models, &MatchFilters::default());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.tier == MatchTier::Difficult));
    }

    // ────────────────────────────────────────────────────────────────────
    // Re-sorting and grouping
    // ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_sort_matches_modes() {
        let hw = test_hardware(48.0, 800.0);
        let mut old = test_model("old", 30.0, 20.0);
        old.release_date = "2024-04-18".to_string();
        old.benchmarks.mmlu_pro = Some(0.55);
        old.ratings.overall = 4;
        let mut new = test_model("new", 8.0, 6.0);
        new.release_date = "2025-04-29".to_string();
        new.ratings.overall = 4;
        let mut scored = test_model("scored", 14.0, 10.0);
        scored.release_date = "2024-12-12".to_string();
        scored.benchmarks.mmlu_pro = Some(0.70);
        scored.ratings.overall = 4;
        let models = vec![old, new, scored];
        let matched = match_models(&hw, &models, &MatchFilters::default());

        let by = |mode| ids(&sort_matches(matched.clone(), mode)).join(",");

        assert_eq!(by(SortMode::Recommended), "old,scored,new");
        assert_eq!(by(SortMode::Benchmark), "scored,old,new");
        assert_eq!(by(SortMode::ReleaseDate), "new,scored,old");
        assert_eq!(by(SortMode::ParamAsc), "new,scored,old");
        assert_eq!(by(SortMode::ParamDesc), "old,scored,new");
        // 4/6 > 4/10 > 4/20
        assert_eq!(by(SortMode::VramEfficiency), "new,scored,old");
    }

    #[test]
    fn test_sort_mode_parse() {
        assert_eq!(SortMode::parse("vram-efficiency"), Some(SortMode::VramEfficiency));
        assert_eq!(SortMode::parse("PARAM_ASC"), Some(SortMode::ParamAsc));
        assert_eq!(SortMode::parse("popularity"), None);
        assert_eq!(SortMode::default(), SortMode::Recommended);
    }

    #[test]
    fn test_tier_groups_preserve_order() {
        let hw = test_hardware(16.0, 500.0);
        let models = vec![
            test_model("c1", 4.0, 4.0),
            test_model("p1", 14.0, 15.0),
            test_model("c2", 8.0, 6.0),
            flat_model("d1", 30.0),
        ];
        let results = match_models(&hw, &models, &MatchFilters::default());
        let groups = TierGroups::from_matches(&results);

        assert_eq!(ids(&groups.comfortable), vec!["c2", "c1"]);
        assert_eq!(ids(groups.get(MatchTier::Possible)), vec!["p1"]);
        assert_eq!(ids(&groups.difficult), vec!["d1"]);
        assert_eq!(groups.runnable_count(), 3);
    }

    #[test]
    fn test_utilization_and_efficiency() {
        let hw = test_hardware(20.0, 500.0);
        let mut model = test_model("u", 8.0, 10.0);
        model.ratings.overall = 5;
        let models = vec![model];
        let r = match_models(&hw, &models, &MatchFilters::default())[0];
        assert_eq!(r.utilization_pct(), 50.0);
        assert_eq!(r.vram_efficiency(), 0.5);
    }
}
