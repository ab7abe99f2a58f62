use anyhow::Result;
use colored::*;
use tabled::{Table, Tabled, builder::Builder, settings::Style};
use vramfit_core::fit::{MatchResult, MatchTier, TierGroups};
use vramfit_core::hardware::Hardware;
use vramfit_core::models::{Benchmark, LlmModel, QuantLevel};

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Model")]
    name: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Quant")]
    quant: String,
    #[tabled(rename = "VRAM")]
    vram: String,
    #[tabled(rename = "Context")]
    context: String,
    #[tabled(rename = "Speed")]
    speed: String,
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "JP")]
    japanese: String,
}

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Model")]
    name: String,
    #[tabled(rename = "Developer")]
    developer: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Q4 @8K")]
    q4_vram: String,
    #[tabled(rename = "Categories")]
    categories: String,
    #[tabled(rename = "JP")]
    japanese: String,
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Released")]
    released: String,
}

#[derive(Tabled)]
struct HardwareRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Hardware")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "VRAM")]
    vram: String,
    #[tabled(rename = "Bandwidth")]
    bandwidth: String,
    #[tabled(rename = "Memory")]
    memory_type: String,
    #[tabled(rename = "TDP")]
    tdp: String,
    #[tabled(rename = "Price")]
    price: String,
}

pub fn display_hardware_list(hardware: &[&Hardware]) {
    if hardware.is_empty() {
        println!("\n{}", "No hardware in this category.".yellow());
        return;
    }

    println!("\n{}", "=== Hardware Catalog ===".bold().cyan());
    println!("Total: {}\n", hardware.len());

    let rows: Vec<HardwareRow> = hardware
        .iter()
        .map(|h| HardwareRow {
            id: h.id.clone(),
            name: h.name.clone(),
            category: h.category.label().to_string(),
            vram: format!("{} GB", h.vram_gb),
            bandwidth: format!("{:.0} GB/s", h.memory_bandwidth_gbps),
            memory_type: h.memory_type.clone(),
            tdp: format!("{} W", h.tdp_watts),
            price: h.price_range.clone(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn display_hardware_summary(hw: &Hardware) {
    println!("\n{}", format!("=== {} ===", hw.name).bold().cyan());
    println!(
        "{}: {} GB   {}: {:.0} GB/s   {}: {}",
        "VRAM".bold(),
        hw.vram_gb,
        "Bandwidth".bold(),
        hw.memory_bandwidth_gbps,
        "Memory".bold(),
        hw.memory_type
    );
    if hw.unified_memory {
        println!("  Unified memory: shared between CPU and GPU");
    }
}

pub fn display_catalog(models: &[&LlmModel]) {
    if models.is_empty() {
        println!("\n{}", "No models match these filters.".yellow());
        return;
    }

    println!("\n{}", "=== Model Catalog ===".bold().cyan());
    println!("Total models: {}\n", models.len());

    let rows: Vec<ModelRow> = models
        .iter()
        .map(|m| ModelRow {
            id: m.id.clone(),
            name: m.name.clone(),
            developer: m.developer.clone(),
            size: m.param_label(),
            q4_vram: vram_label(m.recommended_vram.at_8k(QuantLevel::Q4)),
            categories: m
                .categories
                .iter()
                .map(|c| c.id())
                .collect::<Vec<_>>()
                .join(", "),
            japanese: m.japanese_support.mark().to_string(),
            rating: stars(m.ratings.overall),
            released: m.release_date.clone(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

fn tier_heading(tier: MatchTier, count: usize) -> ColoredString {
    let text = format!("{} {} ({})", tier.emoji(), tier.label(), count);
    match tier {
        MatchTier::Comfortable => text.green().bold(),
        MatchTier::Possible => text.yellow().bold(),
        MatchTier::Difficult => text.red().bold(),
    }
}

pub fn display_tiers(groups: &TierGroups<'_>) {
    if groups.comfortable.is_empty() && groups.possible.is_empty() && groups.difficult.is_empty() {
        println!("\n{}", "No models match these filters.".yellow());
        return;
    }

    println!(
        "\n{} model(s) run on this hardware\n",
        groups.runnable_count().to_string().bold()
    );

    for tier in MatchTier::ALL {
        let results = groups.get(tier);
        if results.is_empty() {
            continue;
        }
        println!("{}", tier_heading(tier, results.len()));

        let rows: Vec<MatchRow> = results
            .iter()
            .map(|r| MatchRow {
                name: r.model.name.clone(),
                size: r.model.param_label(),
                quant: r.quant_level.label().to_string(),
                vram: format!(
                    "{} / {} GB",
                    vram_label(r.required_vram),
                    r.available_vram
                ),
                context: r.max_context.label().to_string(),
                speed: r.estimated_speed.label().to_string(),
                rating: stars(r.model.ratings.overall),
                japanese: r.model.japanese_support.mark().to_string(),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}\n", table);
    }
}

pub fn display_model_detail(model: &LlmModel, compatible: &[&Hardware]) {
    println!("\n{}", format!("=== {} ===", model.name).bold().cyan());
    if !model.description.is_empty() {
        println!("{}", model.description);
    }
    println!();
    println!("{}: {}", "Developer".bold(), model.developer);
    println!("{}: {}", "Family".bold(), model.family);
    println!(
        "{}: {} ({})",
        "Parameters".bold(),
        model.param_label(),
        model.architecture.label()
    );
    println!(
        "{}: {} tokens",
        "Context Length".bold(),
        model.context_length
    );
    println!(
        "{}: {} (commercial use: {})",
        "License".bold(),
        model.license,
        if model.commercial_use { "yes" } else { "no" }
    );
    println!("{}: {}", "Released".bold(), model.release_date);
    println!(
        "{}: {}",
        "Categories".bold(),
        model
            .categories
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(" / ")
    );
    println!(
        "{}: {}",
        "Japanese".bold(),
        model.japanese_support.mark()
    );
    println!();

    println!("{}", "VRAM Requirements:".bold().underline());
    println!("  {:<8} {:>9} {:>9} {:>9}", "", "weights", "8K ctx", "32K ctx");
    for quant in [QuantLevel::Fp16, QuantLevel::Q8, QuantLevel::Q4, QuantLevel::Q3] {
        let weights = model.vram_requirements.get(quant);
        if weights.is_none() && quant == QuantLevel::Q3 {
            continue;
        }
        println!(
            "  {:<8} {:>9} {:>9} {:>9}",
            quant.label(),
            option_gb(weights),
            option_gb(model.recommended_vram.context8k.get(quant)),
            option_gb(model.recommended_vram.context32k.get(quant)),
        );
    }
    println!();

    let benchmarks = model.benchmarks.entries();
    if !benchmarks.is_empty() {
        println!("{}", "Benchmarks:".bold().underline());
        for (benchmark, score) in benchmarks {
            println!("  {:<14} {:>5.1}", benchmark.label(), score * 100.0);
        }
        println!();
    }

    println!("{}", "Ratings:".bold().underline());
    let r = &model.ratings;
    println!("  Overall      {}", stars(r.overall));
    println!("  Coding       {}", stars(r.coding));
    println!("  Reasoning    {}", stars(r.reasoning));
    println!("  Creative     {}", stars(r.creative));
    println!("  Multilingual {}", stars(r.multilingual));
    println!();

    let commands = model.quick_start.commands();
    if !commands.is_empty() {
        println!("{}", "Quick Start:".bold().underline());
        for (engine, cmd) in commands {
            println!("  {:<10} {}", engine, cmd.green());
        }
        println!();
    }

    println!("{}", "Compatible Hardware (Q4, 8K context):".bold().underline());
    if compatible.is_empty() {
        println!("  {}", "None in the catalog".yellow());
    }
    for hw in compatible {
        println!("  {:<28} {:>6} GB", hw.name, hw.vram_gb);
    }
    println!();

    if !model.notes.is_empty() {
        println!("{}", "Notes:".bold().underline());
        println!("  {}", model.notes);
        println!();
    }
}

pub fn display_comparison(models: &[&LlmModel]) {
    let mut builder = Builder::default();

    let mut header = vec![String::new()];
    header.extend(models.iter().map(|m| m.name.clone()));
    builder.push_record(header);

    let mut row = |label: &str, cell: &dyn Fn(&LlmModel) -> String| {
        let mut record = vec![label.to_string()];
        record.extend(models.iter().map(|m| cell(m)));
        builder.push_record(record);
    };

    row("Developer", &|m| m.developer.clone());
    row("Parameters", &|m| m.param_label());
    row("Architecture", &|m| m.architecture.label().to_string());
    row("Context", &|m| format!("{}K", m.context_length / 1024));
    row("License", &|m| m.license.clone());
    row("Released", &|m| m.release_date.clone());
    row("Japanese", &|m| m.japanese_support.mark().to_string());
    for quant in [QuantLevel::Q4, QuantLevel::Q8, QuantLevel::Fp16] {
        let label = format!("{} @8K", quant.label());
        row(&label, &|m| vram_label(m.recommended_vram.at_8k(quant)));
    }
    for benchmark in Benchmark::ALL {
        if models.iter().all(|m| m.benchmarks.get(benchmark).is_none()) {
            continue;
        }
        row(benchmark.label(), &|m| {
            m.benchmarks
                .get(benchmark)
                .map(|s| format!("{:.1}", s * 100.0))
                .unwrap_or_else(|| "-".to_string())
        });
    }
    row("Overall", &|m| stars(m.ratings.overall));
    row("Coding", &|m| stars(m.ratings.coding));
    row("Reasoning", &|m| stars(m.ratings.reasoning));
    row("Creative", &|m| stars(m.ratings.creative));
    row("Multilingual", &|m| stars(m.ratings.multilingual));

    println!("\n{}", "=== Model Comparison ===".bold().cyan());
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{}", table);
}

// ────────────────────────────────────────────────────────────────────
// JSON output for scripts
// ────────────────────────────────────────────────────────────────────

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn display_json_hardware(hardware: &[&Hardware]) -> Result<()> {
    print_json(&serde_json::json!({ "hardware": hardware }))
}

pub fn display_json_models(models: &[&LlmModel]) -> Result<()> {
    print_json(&serde_json::json!({ "models": models }))
}

pub fn display_json_matches(hw: &Hardware, results: &[MatchResult<'_>]) -> Result<()> {
    let matches: Vec<serde_json::Value> = results.iter().map(match_to_json).collect();
    print_json(&serde_json::json!({
        "hardware": hw,
        "matches": matches,
    }))
}

pub fn display_json_model_detail(model: &LlmModel, compatible: &[&Hardware]) -> Result<()> {
    let compatible_ids: Vec<&str> = compatible.iter().map(|h| h.id.as_str()).collect();
    print_json(&serde_json::json!({
        "model": model,
        "compatible_hardware": compatible_ids,
    }))
}

pub fn display_json_comparison(models: &[&LlmModel]) -> Result<()> {
    print_json(&serde_json::json!({ "models": models }))
}

fn match_to_json(r: &MatchResult<'_>) -> serde_json::Value {
    serde_json::json!({
        "model_id": r.model.id,
        "name": r.model.name,
        "parameter_count": r.model.parameter_count,
        "tier": r.tier,
        "quant_level": r.quant_level,
        "quant_label": r.quant_level.label(),
        "required_vram_gb": finite_or_null(r.required_vram),
        "available_vram_gb": round2(r.available_vram),
        "utilization_pct": finite_or_null(r.utilization_pct()),
        "max_context": r.max_context,
        "estimated_speed": r.estimated_speed,
        "overall_rating": r.model.ratings.overall,
    })
}

/// Infinite figures (absent catalog data) serialize as null.
fn finite_or_null(v: f64) -> Option<f64> {
    v.is_finite().then(|| round1(v))
}

fn vram_label(gb: f64) -> String {
    if gb.is_finite() {
        format!("{:.1}", gb)
    } else {
        "-".to_string()
    }
}

fn option_gb(gb: Option<f64>) -> String {
    gb.map(|v| format!("{:.1} GB", v))
        .unwrap_or_else(|| "-".to_string())
}

fn stars(rating: u8) -> String {
    let filled = rating.min(5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
