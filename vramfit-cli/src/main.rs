mod config;
mod display;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use vramfit_core::fit::{MatchFilters, SortMode, TierGroups, match_models, sort_matches};
use vramfit_core::hardware::{Hardware, HardwareCategory, HardwareDatabase, parse_memory_size};
use vramfit_core::models::{Architecture, CatalogQuery, Category, LlmModel, QuantLevel, SizeRange};

use crate::config::Catalogs;

/// Bandwidth assumed for `--vram` profiles when `--bandwidth` is not given.
const DEFAULT_BANDWIDTH_GBPS: f64 = 250.0;

#[derive(Parser)]
#[command(name = "vramfit")]
#[command(about = "Find which local LLMs run comfortably on your GPU", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output results as JSON (for scripts)
    #[arg(long, global = true)]
    json: bool,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Model catalog JSON to use instead of the built-in one.
    /// Falls back to VRAMFIT_MODELS_FILE if not set.
    #[arg(long, value_name = "PATH", global = true)]
    models_file: Option<PathBuf>,

    /// Hardware catalog JSON to use instead of the built-in one.
    /// Falls back to VRAMFIT_HARDWARE_FILE if not set.
    #[arg(long, value_name = "PATH", global = true)]
    hardware_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List hardware in the catalog
    Hardware {
        /// nvidia_consumer, nvidia_pro, amd, apple_silicon, dedicated_ai, multi_gpu
        #[arg(long)]
        category: Option<String>,
    },

    /// Browse the model catalog
    Models {
        /// Match against name, family or developer
        #[arg(short, long)]
        search: Option<String>,

        /// general, coding, math, reasoning, multilingual, rag, agent, creative
        #[arg(long)]
        category: Option<String>,

        /// ~3B, 3~8B, 8~14B, 14~32B, 32~70B, 70B~ ('-' works in place of '~')
        #[arg(long, value_name = "RANGE")]
        size_range: Option<String>,

        /// recommended, benchmark, vram_efficiency, release_date, param_asc, param_desc
        #[arg(long, default_value = "recommended")]
        sort: String,
    },

    /// Sort models into comfortable / possible / difficult for one GPU
    Match {
        /// Hardware id (see `vramfit hardware`)
        #[arg(required_unless_present = "vram", conflicts_with = "vram")]
        hardware: Option<String>,

        /// Describe hardware that isn't in the catalog (e.g. "24G", "12288M")
        #[arg(long, value_name = "SIZE")]
        vram: Option<String>,

        /// Memory bandwidth for --vram, in GB/s
        #[arg(long, value_name = "GBPS", requires = "vram")]
        bandwidth: Option<f64>,

        #[command(flatten)]
        filters: FilterArgs,

        /// recommended, benchmark, vram_efficiency, release_date, param_asc, param_desc
        #[arg(long, default_value = "recommended")]
        sort: String,

        /// Limit number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show details and compatible hardware for one model
    Info {
        /// Model id (see `vramfit models`)
        model: String,
    },

    /// Compare two to four models side by side
    Compare {
        /// Model ids
        #[arg(required = true, num_args = 2..=4)]
        models: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Keep models with any of these categories (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    categories: Vec<String>,

    /// ~3B, 3~8B, 8~14B, 14~32B, 32~70B, 70B~
    #[arg(long, value_name = "RANGE")]
    size_range: Option<String>,

    /// Only models licensed for commercial use
    #[arg(long)]
    commercial_only: bool,

    /// Only models with good or excellent Japanese
    #[arg(long)]
    japanese_only: bool,

    /// Evaluate a single quantization: fp16, q8, q4, q3
    #[arg(long, value_name = "QUANT")]
    quant: Option<String>,

    /// dense or moe
    #[arg(long, value_name = "ARCH")]
    architecture: Option<String>,
}

impl FilterArgs {
    /// Unrecognised values are dropped with a warning, leaving that
    /// constraint off.
    fn to_filters(&self) -> MatchFilters {
        MatchFilters {
            categories: self
                .categories
                .iter()
                .filter_map(|s| parse_or_warn("category", s, Category::parse))
                .collect(),
            size_range: self
                .size_range
                .as_deref()
                .and_then(|s| parse_or_warn("size range", s, SizeRange::from_label)),
            commercial_only: self.commercial_only,
            japanese_only: self.japanese_only,
            quant_level: self
                .quant
                .as_deref()
                .and_then(|s| parse_or_warn("quantization", s, QuantLevel::parse)),
            architecture: self
                .architecture
                .as_deref()
                .and_then(|s| parse_or_warn("architecture", s, Architecture::parse)),
        }
    }
}

fn parse_or_warn<T>(what: &str, raw: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let parsed = parse(raw);
    if parsed.is_none() {
        tracing::warn!("ignoring unknown {} '{}'", what, raw);
    }
    parsed
}

fn parse_sort(raw: &str) -> SortMode {
    parse_or_warn("sort mode", raw, SortMode::parse).unwrap_or_default()
}

/// Catalog entry by id, or an ad-hoc profile from `--vram`.
fn select_hardware(
    db: &HardwareDatabase,
    id: Option<&str>,
    vram: Option<&str>,
    bandwidth: Option<f64>,
) -> Result<Hardware> {
    if let Some(raw) = vram {
        let vram_gb = parse_memory_size(raw).with_context(|| {
            format!("could not parse --vram value '{raw}'. Expected format: 24G, 24576M, 1.5T")
        })?;
        return Ok(Hardware::custom(
            vram_gb,
            bandwidth.unwrap_or(DEFAULT_BANDWIDTH_GBPS),
        ));
    }

    let id = id.context("give a hardware id or --vram")?;
    db.find_by_id(id)
        .cloned()
        .with_context(|| format!("unknown hardware '{id}'. Run `vramfit hardware` to list ids"))
}

fn find_model<'a>(catalogs: &'a Catalogs, id: &str) -> Result<&'a LlmModel> {
    catalogs
        .models
        .find_by_id(id)
        .with_context(|| format!("unknown model '{id}'. Run `vramfit models` to list ids"))
}

fn run_hardware(catalogs: &Catalogs, category: Option<&str>, json: bool) -> Result<()> {
    let hardware: Vec<&Hardware> =
        match category.and_then(|c| parse_or_warn("hardware category", c, HardwareCategory::parse)) {
            Some(category) => catalogs.hardware.by_category(category),
            None => catalogs.hardware.get_all().iter().collect(),
        };

    if json {
        display::display_json_hardware(&hardware)
    } else {
        display::display_hardware_list(&hardware);
        Ok(())
    }
}

fn run_models(catalogs: &Catalogs, query: &CatalogQuery, json: bool) -> Result<()> {
    let models = catalogs.models.browse(query);

    if json {
        display::display_json_models(&models)
    } else {
        display::display_catalog(&models);
        Ok(())
    }
}

fn run_match(
    catalogs: &Catalogs,
    hardware: &Hardware,
    filters: &MatchFilters,
    sort: SortMode,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let results = match_models(hardware, catalogs.models.get_all_models(), filters);
    let mut results = sort_matches(results, sort);

    if let Some(n) = limit {
        results.truncate(n);
    }

    if json {
        display::display_json_matches(hardware, &results)
    } else {
        display::display_hardware_summary(hardware);
        display::display_tiers(&TierGroups::from_matches(&results));
        Ok(())
    }
}

fn run_info(catalogs: &Catalogs, id: &str, json: bool) -> Result<()> {
    let model = find_model(catalogs, id)?;
    let compatible = catalogs.hardware.compatible_with(model);

    if json {
        display::display_json_model_detail(model, &compatible)
    } else {
        display::display_model_detail(model, &compatible);
        Ok(())
    }
}

fn run_compare(catalogs: &Catalogs, ids: &[String], json: bool) -> Result<()> {
    if !(2..=4).contains(&ids.len()) {
        bail!("compare takes two to four model ids, got {}", ids.len());
    }
    let models = ids
        .iter()
        .map(|id| find_model(catalogs, id))
        .collect::<Result<Vec<_>>>()?;

    if json {
        display::display_json_comparison(&models)
    } else {
        display::display_comparison(&models);
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let catalogs = Catalogs::load(cli.models_file, cli.hardware_file)?;

    match cli.command {
        Commands::Hardware { category } => run_hardware(&catalogs, category.as_deref(), cli.json),

        Commands::Models {
            search,
            category,
            size_range,
            sort,
        } => {
            let query = CatalogQuery {
                search,
                category: category
                    .as_deref()
                    .and_then(|s| parse_or_warn("category", s, Category::parse)),
                size_range: size_range
                    .as_deref()
                    .and_then(|s| parse_or_warn("size range", s, SizeRange::from_label)),
                sort: parse_sort(&sort),
            };
            run_models(&catalogs, &query, cli.json)
        }

        Commands::Match {
            hardware,
            vram,
            bandwidth,
            filters,
            sort,
            limit,
        } => {
            let hw = select_hardware(
                &catalogs.hardware,
                hardware.as_deref(),
                vram.as_deref(),
                bandwidth,
            )?;
            run_match(
                &catalogs,
                &hw,
                &filters.to_filters(),
                parse_sort(&sort),
                limit,
                cli.json,
            )
        }

        Commands::Info { model } => run_info(&catalogs, &model, cli.json),

        Commands::Compare { models } => run_compare(&catalogs, &models, cli.json),
    }
}
