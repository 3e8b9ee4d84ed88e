use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use dieline_core::prelude::*;
use dieline_core::{DielineError, placed_from_json, slugs_to_json, to_json};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "dieline",
    about = "Lay out corrugated box dielines and slug sheets",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lay out every box job found in a file or directory
    Layout(LayoutArgs),
    /// Print the computed board geometry for one box as JSON
    Geometry(GeometryArgs),
    /// Re-pack an exported layout's placed elements onto slug sheets
    Slugs(SlugArgs),
    /// Simple timing bench (lays out a job file repeatedly, prints time)
    Bench(BenchArgs),
}

#[derive(Args, Debug, Clone)]
struct SheetArgs {
    /// Slug sheet width (inches)
    #[arg(long, help_heading = "Slugs")]
    sheet_width: Option<f64>,
    /// Slug sheet height (inches)
    #[arg(long, help_heading = "Slugs")]
    sheet_height: Option<f64>,
    /// Unused border around each sheet (inches)
    #[arg(long, help_heading = "Slugs")]
    page_border: Option<f64>,
    /// Gap between slugs (inches)
    #[arg(long, help_heading = "Slugs")]
    slug_spacing: Option<f64>,
}

impl SheetArgs {
    fn apply(&self, mut cfg: SlugConfig) -> SlugConfig {
        if let Some(v) = self.sheet_width {
            cfg.sheet_width = v;
        }
        if let Some(v) = self.sheet_height {
            cfg.sheet_height = v;
        }
        if let Some(v) = self.page_border {
            cfg.page_border = v;
        }
        if let Some(v) = self.slug_spacing {
            cfg.slug_spacing = v;
        }
        cfg
    }
}

#[derive(Parser, Debug, Clone)]
struct LayoutArgs {
    // Input/Output
    /// Job file (YAML or JSON) or a directory of job files
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// YAML config file path (overrides layout and slug defaults)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Layout
    /// Keep-out band along cuts and scores (inches)
    #[arg(long, help_heading = "Layout")]
    margin_width: Option<f64>,
    /// Collision retries per element
    #[arg(long, help_heading = "Layout")]
    max_iterations: Option<usize>,
    /// Average glyph width as a fraction of the point size, for text sizing
    #[arg(long, default_value_t = 0.6, help_heading = "Layout")]
    glyph_width_ratio: f64,

    // Slugs
    /// Run a slug pass for every job (jobs may also request one themselves)
    #[arg(long, default_value_t = false, help_heading = "Slugs")]
    slugs: bool,
    #[command(flatten)]
    sheet: SheetArgs,

    // Export
    /// Export aggregate layout stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layouts and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct GeometryArgs {
    #[arg(long)]
    length: f64,
    #[arg(long)]
    width: f64,
    #[arg(long)]
    height: f64,
    #[arg(long, default_value = "default")]
    plant: String,
    /// left | right
    #[arg(long, default_value = "left")]
    orientation: String,
    #[arg(long, default_value_t = false)]
    print_header: bool,
    /// YAML config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
struct SlugArgs {
    /// Layout JSON written by `dieline layout`
    input: PathBuf,
    /// Output file (prints to stdout when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// YAML config file path
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(flatten)]
    sheet: SheetArgs,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Job file (YAML or JSON)
    input: PathBuf,
    /// Number of runs
    #[arg(long, default_value_t = 10)]
    runs: u32,
    /// Include the slug pass
    #[arg(long, default_value_t = false)]
    slugs: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Layout(args) => run_layout(args, cli.progress && !cli.quiet),
        Commands::Geometry(args) => run_geometry(args),
        Commands::Slugs(args) => run_slugs(args),
        Commands::Bench(args) => run_bench(args),
    }
}

#[derive(Serialize)]
struct MergedConfig<'a> {
    layout: &'a LayoutConfig,
    slugs: &'a SlugConfig,
}

#[derive(Serialize, Default)]
struct BatchStats {
    jobs: usize,
    failed: usize,
    placed: usize,
    suppressed: usize,
    critical_suppressed: usize,
    scaled: usize,
    min_size_violations: usize,
    sheets: usize,
}

impl BatchStats {
    fn add(&mut self, layout: &BoxLayout) {
        self.jobs += 1;
        self.placed += layout.stats.placed;
        self.suppressed += layout.stats.suppressed;
        self.critical_suppressed += layout.stats.critical_suppressed;
        self.scaled += layout.stats.scaled;
        self.min_size_violations += layout.stats.min_size_violations;
        self.sheets += layout.slugs.as_ref().map_or(0, |s| s.num_sheets);
    }
}

fn run_layout(cli: &LayoutArgs, show_progress: bool) -> anyhow::Result<()> {
    let (mut layout_cfg, slug_cfg) = load_configs(cli.config.as_deref())?;
    if let Some(v) = cli.margin_width {
        layout_cfg.margin_width = v;
    }
    if let Some(v) = cli.max_iterations {
        layout_cfg.max_iterations = v;
    }
    let slug_cfg = cli.sheet.apply(slug_cfg);
    layout_cfg.validate()?;
    slug_cfg.validate()?;

    if cli.print_config {
        let merged = MergedConfig {
            layout: &layout_cfg,
            slugs: &slug_cfg,
        };
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&merged)?),
            _ => println!("{}", serde_json::to_string_pretty(&merged)?),
        }
        return Ok(());
    }

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    }

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let jobs = load_jobs_with_progress(&paths, show_progress)?;
    info!(count = jobs.len(), "loaded box jobs");
    if jobs.is_empty() {
        anyhow::bail!("no box jobs found under {}", cli.input.display());
    }

    let measure = RecordingSurface::new().with_glyph_width_ratio(cli.glyph_width_ratio);
    let bar = progress_bar(jobs.len(), "laying out", show_progress)?;
    let mut totals = BatchStats::default();
    let start = Instant::now();
    for job in &jobs {
        if let Some(b) = &bar {
            b.set_message(job.name.clone());
        }
        let slugs = (cli.slugs || job.slugs).then_some(&slug_cfg);
        match layout_box(job, &layout_cfg, slugs, &measure) {
            Ok(layout) => {
                totals.add(&layout);
                info!(job = %job.name, "{}", layout.stats.summary());
                for d in layout
                    .diagnostics
                    .iter()
                    .filter(|d| d.severity() >= Severity::Critical)
                {
                    warn!(job = %job.name, element = d.name(), "needs review");
                }
                if !cli.dry_run {
                    let path = cli
                        .out_dir
                        .join(format!("{}.layout.json", file_stem_for(&job.name)));
                    let json = serde_json::to_string_pretty(&to_json(&layout))?;
                    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
                    info!(?path, "layout written");
                }
            }
            Err(e) => {
                totals.failed += 1;
                error!(job = %job.name, error = %e, "skip job");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    info!(
        jobs = totals.jobs,
        failed = totals.failed,
        elapsed = %fmt_dur(start.elapsed()),
        "batch finished"
    );

    if let Some(stats_path) = &cli.export_stats {
        fs::write(stats_path, serde_json::to_string_pretty(&totals)?)
            .with_context(|| format!("write {}", stats_path.display()))?;
    }
    Ok(())
}

fn run_geometry(args: &GeometryArgs) -> anyhow::Result<()> {
    let (cfg, _) = load_configs(args.config.as_deref())?;
    let orientation: Orientation = args
        .orientation
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown orientation: {}", args.orientation))?;
    let geometry = BoxGeometry::compute(
        BoxDimensions::new(args.length, args.width, args.height),
        &args.plant,
        orientation,
        args.print_header,
        &cfg,
    )?;
    println!("{}", serde_json::to_string_pretty(&geometry)?);
    Ok(())
}

fn run_slugs(args: &SlugArgs) -> anyhow::Result<()> {
    let (_, slug_cfg) = load_configs(args.config.as_deref())?;
    let slug_cfg = args.sheet.apply(slug_cfg);
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    let doc: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parse {}", args.input.display()))?;
    let elements = placed_from_json(&doc)?;
    if elements.is_empty() {
        return Err(DielineError::Empty.into());
    }
    let layout = SlugPacker::new(slug_cfg)?.pack(&elements)?;
    info!("{}", layout.stats().summary());
    let json = serde_json::to_string_pretty(&slugs_to_json(&layout))?;
    match &args.out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("write {}", path.display()))?
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    let jobs = load_job_file(&b.input)?;
    let cfg = LayoutConfig::default();
    let slug_cfg = SlugConfig::default();
    let slugs = b.slugs.then_some(&slug_cfg);
    let measure = RecordingSurface::new();
    let runs = b.runs.max(1);
    let mut last = LayoutStats::default();
    let start = Instant::now();
    for _ in 0..runs {
        for job in &jobs {
            last = layout_box(job, &cfg, slugs, &measure)?.stats;
        }
    }
    let dur = start.elapsed();
    println!(
        "jobs={} runs={} placed={} suppressed={} time/run={}",
        jobs.len(),
        runs,
        last.placed,
        last.suppressed,
        fmt_dur(dur / runs)
    );
    Ok(())
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn file_stem_for(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Include/exclude globs matched against `/`-separated paths. Exclusion wins.
struct JobFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl JobFilter {
    fn new(include: &[String], exclude: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            include: glob_set(include)?,
            exclude: glob_set(exclude)?,
        })
    }

    fn accepts(&self, p: &Path) -> bool {
        let s = p.to_string_lossy().replace('\\', "/");
        let excluded = self.exclude.as_ref().is_some_and(|g| g.is_match(&s));
        let included = self.include.as_ref().is_none_or(|g| g.is_match(&s));
        included && !excluded
    }
}

fn glob_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob {pat}"))?);
    }
    Ok(Some(b.build()?))
}

/// An explicit file is taken as-is; directories are walked in name order for job files.
fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let filter = JobFilter::new(include, exclude)?;
    if path.is_file() {
        return Ok(filter
            .accepts(path)
            .then(|| path.to_path_buf())
            .into_iter()
            .collect());
    }
    Ok(WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.is_file() && is_job_file(p) && filter.accepts(p))
        .collect())
}

/// YAML/JSON files, excluding our own `.layout.json` outputs.
fn is_job_file(p: &Path) -> bool {
    let name = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
    if name.ends_with(".layout.json") {
        return false;
    }
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("yaml" | "yml" | "json")
    )
}

/// A job file holds one job or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum JobFile {
    One(Box<BoxJob>),
    Many(Vec<BoxJob>),
}

fn load_job_file(p: &Path) -> anyhow::Result<Vec<BoxJob>> {
    let text = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    let is_json = p
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let file: JobFile = if is_json {
        serde_json::from_str(&text).with_context(|| format!("parse {}", p.display()))?
    } else {
        serde_yaml::from_str(&text).with_context(|| format!("parse {}", p.display()))?
    };
    Ok(match file {
        JobFile::One(job) => vec![*job],
        JobFile::Many(jobs) => jobs,
    })
}

fn progress_bar(
    len: usize,
    verb: &str,
    show: bool,
) -> anyhow::Result<Option<indicatif::ProgressBar>> {
    use indicatif::{ProgressBar, ProgressStyle};
    if !show {
        return Ok(None);
    }
    let b = ProgressBar::new(len as u64);
    b.set_style(ProgressStyle::with_template(&format!(
        "{{spinner:.green}} {verb} {{pos}}/{{len}} [{{elapsed_precise}}] {{wide_msg}}"
    ))?);
    Ok(Some(b))
}

fn load_jobs_with_progress(paths: &[PathBuf], progress: bool) -> anyhow::Result<Vec<BoxJob>> {
    let bar = progress_bar(paths.len(), "loading", progress)?;
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_job_file(p) {
            Ok(jobs) => list.extend(jobs),
            Err(e) => {
                error!(?p, error = %e, "skip job file");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

/// `RUST_LOG` wins when set; otherwise the level follows `--quiet` / `-v`.
fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Optional overrides read from `--config`. Unset keys keep the defaults.
#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    margin_width: Option<f64>,
    canvas_bleed: Option<f64>,
    header_ratio: Option<f64>,
    max_iterations: Option<usize>,
    /// Extra or replacement plant rows.
    #[serde(default)]
    plants: Vec<PlantProfile>,
    sheet_width: Option<f64>,
    sheet_height: Option<f64>,
    page_border: Option<f64>,
    center_mark_length: Option<f64>,
    center_mark_distance: Option<f64>,
    corner_mark_length: Option<f64>,
    slug_spacing: Option<f64>,
}

impl YamlConfig {
    fn into_configs(self) -> (LayoutConfig, SlugConfig) {
        let mut layout = LayoutConfig::default();
        if let Some(v) = self.margin_width {
            layout.margin_width = v;
        }
        if let Some(v) = self.canvas_bleed {
            layout.canvas_bleed = v;
        }
        if let Some(v) = self.header_ratio {
            layout.header_ratio = v;
        }
        if let Some(v) = self.max_iterations {
            layout.max_iterations = v;
        }
        for plant in self.plants {
            layout.plants.insert(plant);
        }

        let mut slugs = SlugConfig::default();
        if let Some(v) = self.sheet_width {
            slugs.sheet_width = v;
        }
        if let Some(v) = self.sheet_height {
            slugs.sheet_height = v;
        }
        if let Some(v) = self.page_border {
            slugs.page_border = v;
        }
        if let Some(v) = self.center_mark_length {
            slugs.center_mark_length = v;
        }
        if let Some(v) = self.center_mark_distance {
            slugs.center_mark_distance = v;
        }
        if let Some(v) = self.corner_mark_length {
            slugs.corner_mark_length = v;
        }
        if let Some(v) = self.slug_spacing {
            slugs.slug_spacing = v;
        }
        (layout, slugs)
    }
}

fn load_configs(path: Option<&Path>) -> anyhow::Result<(LayoutConfig, SlugConfig)> {
    let Some(path) = path else {
        return Ok((LayoutConfig::default(), SlugConfig::default()));
    };
    let file = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let y: YamlConfig =
        serde_yaml::from_str(&file).with_context(|| format!("parse {}", path.display()))?;
    Ok(y.into_configs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclude_beats_include() {
        let filter = JobFilter::new(&["**/*.yaml".into()], &["**/drafts/**".into()]).expect("globs");
        assert!(filter.accepts(Path::new("jobs/kenton/box.yaml")));
        assert!(!filter.accepts(Path::new("jobs/drafts/box.yaml")));
        assert!(!filter.accepts(Path::new("jobs/box.json")));
        assert!(JobFilter::new(&[], &[]).expect("globs").accepts(Path::new("any.json")));
    }

    #[test]
    fn exported_layouts_are_not_job_files() {
        assert!(is_job_file(Path::new("a/box.yml")));
        assert!(is_job_file(Path::new("a/box.JSON")));
        assert!(!is_job_file(Path::new("out/box.layout.json")));
        assert!(!is_job_file(Path::new("a/readme.md")));
    }

    #[test]
    fn job_files_hold_one_job_or_a_list() {
        let one: JobFile = serde_yaml::from_str(
            "name: a\ndimensions: { length: 14.0, width: 12.0, height: 16.375 }\n",
        )
        .expect("one");
        assert!(matches!(one, JobFile::One(_)));
        let many: JobFile = serde_json::from_str(
            r#"[{ "name": "a", "dimensions": { "length": 14.0, "width": 12.0, "height": 16.375 } },
                { "name": "b", "dimensions": { "length": 10.0, "width": 8.0, "height": 9.0 } }]"#,
        )
        .expect("many");
        assert!(matches!(many, JobFile::Many(ref jobs) if jobs.len() == 2));
    }

    #[test]
    fn file_stems_are_filesystem_safe() {
        assert_eq!(file_stem_for("kenton 14x12/v2"), "kenton_14x12_v2");
    }
}
