use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{DynamicImage, ImageReader};
use serde::Deserialize;
use skyline_atlas_core::{
    AtlasConfig, AtlasError, AtlasMeta, AtlasSession, PixelDepth, save_png, to_json, to_json_hash,
};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "skyline-atlas",
    about = "Pack images into skyline texture atlases",
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
    /// Pack images into one or more atlas pages (PNG + JSON)
    Pack(PackArgs),
    /// Compute the layout and print it with stats; writes nothing
    Inspect(LayoutArgs),
}

/// Inputs and page options shared by `pack` and `inspect`.
#[derive(Args, Debug, Clone)]
struct LayoutArgs {
    // Input
    /// Input file or directory
    #[arg(help_heading = "Input")]
    input: PathBuf,
    /// YAML config file path (overrides page options)
    #[arg(long, help_heading = "Input")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input")]
    exclude: Vec<String>,

    // Page
    /// Page width, including the 1px border
    #[arg(long, default_value_t = 512, help_heading = "Page")]
    width: u32,
    /// Page height, including the 1px border
    #[arg(long, default_value_t = 512, help_heading = "Page")]
    height: u32,
    /// Bytes per pixel: 1|alpha, 3|rgb, 4|rgba
    #[arg(long, default_value = "rgba", help_heading = "Page")]
    depth: String,
    /// Round page dims up to a power of two
    #[arg(long, default_value_t = false, help_heading = "Page")]
    pow2: bool,
    /// Insertion order: height_desc|area_desc|name_asc|none
    #[arg(long, default_value = "height_desc", help_heading = "Page")]
    sort_order: String,
}

#[derive(Args, Debug, Clone)]
struct PackArgs {
    #[command(flatten)]
    layout: LayoutArgs,

    // Output
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Output")]
    out_dir: PathBuf,
    /// Atlas base name (pages become name_0.png, name_1.png, ...)
    #[arg(short, long, default_value = "atlas", help_heading = "Output")]
    name: String,
    /// Metadata format: json-array | json (alias) | json-hash
    #[arg(long, default_value = "json-array", help_heading = "Output")]
    metadata: String,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Output")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Output")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Output")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Output")]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Inspect(args) => run_inspect(args),
    }
}

#[derive(Debug, Clone, Copy)]
enum SortOrder {
    HeightDesc,
    AreaDesc,
    NameAsc,
    None,
}

fn parse_sort_order(s: &str) -> anyhow::Result<SortOrder> {
    Ok(match s.to_ascii_lowercase().as_str() {
        "height_desc" => SortOrder::HeightDesc,
        "area_desc" => SortOrder::AreaDesc,
        "name_asc" => SortOrder::NameAsc,
        "none" => SortOrder::None,
        other => anyhow::bail!("unknown sort order: {}", other),
    })
}

struct InputImage {
    key: String,
    image: DynamicImage,
}

/// Builds the session config from flags, then applies the YAML file on top.
fn build_config(cli: &LayoutArgs) -> anyhow::Result<AtlasConfig> {
    let depth: PixelDepth = cli.depth.parse()?;
    let mut cfg = AtlasConfig::builder()
        .with_dimensions(cli.width, cli.height)
        .depth(depth)
        .pow2(cli.pow2)
        .build();
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.into_atlas_config(cfg)?;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Loads, orders and packs every input. Items larger than an empty page are
/// logged and skipped.
fn pack_inputs(
    cli: &LayoutArgs,
    cfg: AtlasConfig,
    show_progress: bool,
) -> anyhow::Result<(AtlasSession, Vec<String>)> {
    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let mut inputs = load_images_with_progress(&cli.input, &paths, show_progress)?;
    info!(count = inputs.len(), "loaded input images");
    sort_inputs(&mut inputs, parse_sort_order(&cli.sort_order)?);

    let mut session = AtlasSession::new(cfg)?;
    let mut skipped = Vec::new();
    for inp in &inputs {
        match session.append_image(inp.key.clone(), &inp.image) {
            Ok(_) => {}
            Err(AtlasError::OutOfSpace { w, h }) => {
                warn!(key = %inp.key, w, h, "image does not fit an empty page, skipped");
                skipped.push(inp.key.clone());
            }
            Err(e) => return Err(e).with_context(|| format!("pack {}", inp.key)),
        }
    }
    Ok((session, skipped))
}

fn sort_inputs(inputs: &mut [InputImage], order: SortOrder) {
    match order {
        SortOrder::HeightDesc => inputs.sort_by(|a, b| {
            b.image
                .height()
                .cmp(&a.image.height())
                .then_with(|| b.image.width().cmp(&a.image.width()))
                .then_with(|| a.key.cmp(&b.key))
        }),
        SortOrder::AreaDesc => inputs.sort_by(|a, b| {
            let area = |i: &InputImage| i.image.width() as u64 * i.image.height() as u64;
            area(b).cmp(&area(a)).then_with(|| a.key.cmp(&b.key))
        }),
        SortOrder::NameAsc => inputs.sort_by(|a, b| a.key.cmp(&b.key)),
        SortOrder::None => {}
    }
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(&cli.layout)?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let start = Instant::now();
    let (session, skipped) = pack_inputs(&cli.layout, cfg.clone(), show_progress)?;
    let stats = session.stats();
    info!(
        pages = stats.num_pages,
        regions = stats.num_regions,
        skipped = skipped.len(),
        elapsed = %fmt_dur(start.elapsed()),
        "packed"
    );

    let meta = AtlasMeta::new(cfg.depth, cfg.power_of_two);
    let snapshot = session.snapshot();
    let json = match cli.metadata.as_str() {
        "json-array" | "json" => to_json(&snapshot, &meta),
        "json-hash" => to_json_hash(&snapshot, &meta),
        other => anyhow::bail!("unknown metadata format: {}", other),
    };

    if cli.dry_run {
        println!("{}", stats.summary());
        return Ok(());
    }

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    for (id, page) in session.pages().iter().enumerate() {
        let out_path = cli.out_dir.join(format!("{}_{}.png", cli.name, id));
        save_png(page.surface(), &out_path)
            .with_context(|| format!("write {}", out_path.display()))?;
        info!(?out_path, width = page.width(), height = page.height(), "page written");
    }
    let json_path = cli.out_dir.join(format!("{}.json", cli.name));
    fs::write(&json_path, serde_json::to_string_pretty(&json)?)
        .with_context(|| format!("write {}", json_path.display()))?;
    info!(?json_path, "metadata written");

    if let Some(stats_path) = &cli.export_stats {
        let value = serde_json::json!({
            "stats": stats,
            "skipped": skipped,
        });
        fs::write(stats_path, serde_json::to_string_pretty(&value)?)
            .with_context(|| format!("write {}", stats_path.display()))?;
        info!(?stats_path, "stats exported");
    }
    Ok(())
}

fn run_inspect(cli: &LayoutArgs) -> anyhow::Result<()> {
    let cfg = build_config(cli)?;
    let (session, skipped) = pack_inputs(cli, cfg, false)?;
    for snap in session.snapshot() {
        println!(
            "page {} {}x{} {} used={}",
            snap.id, snap.width, snap.height, snap.depth, snap.used
        );
        for nr in &snap.regions {
            let r = nr.region;
            println!("  {:>5},{:<5} {:>4}x{:<4} {}", r.x, r.y, r.w, r.h, nr.key);
        }
        if let Some(page) = session.page(snap.id) {
            println!("  {}", page.stats().summary());
        }
    }
    for key in &skipped {
        println!("skipped (too large): {key}");
    }
    println!("{}", session.stats().summary());
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

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("invalid glob {pat}"))?);
    }
    Ok(Some(b.build()?))
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    if list.is_empty() {
        anyhow::bail!("no images found under {}", path.display());
    }
    Ok(list)
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg")
    )
}

/// Keys are paths relative to the input directory with `/` separators.
fn key_for(root: &Path, p: &Path) -> String {
    let rel = if root.is_file() {
        p.file_name().map(Path::new).unwrap_or(p)
    } else {
        p.strip_prefix(root).unwrap_or(p)
    };
    rel.to_string_lossy().replace('\\', "/")
}

fn load_images_with_progress(
    root: &Path,
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<Vec<InputImage>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(img) => list.push(InputImage {
                key: key_for(root, p),
                image: img,
            }),
            Err(e) => {
                error!(?p, error = %e, "skip image");
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

fn load_image(p: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YamlConfig {
    width: Option<u32>,
    height: Option<u32>,
    depth: Option<String>,
    power_of_two: Option<bool>,
}

impl YamlConfig {
    fn into_atlas_config(self, mut cfg: AtlasConfig) -> anyhow::Result<AtlasConfig> {
        if let Some(v) = self.width {
            cfg.width = v;
        }
        if let Some(v) = self.height {
            cfg.height = v;
        }
        if let Some(v) = self.depth {
            cfg.depth = v.parse()?;
        }
        if let Some(v) = self.power_of_two {
            cfg.power_of_two = v;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn inspect_rejects_output_flags() {
        let flags: [&[&str]; 5] = [
            &["--out-dir", "x"],
            &["--metadata", "json-hash"],
            &["--export-stats", "s.json"],
            &["--print-config"],
            &["--dry-run"],
        ];
        for flag in flags {
            let mut argv = vec!["skyline-atlas", "inspect", "sprites"];
            argv.extend_from_slice(flag);
            assert!(Cli::try_parse_from(argv).is_err(), "inspect accepted {flag:?}");
        }
    }

    #[test]
    fn inspect_and_pack_share_page_options() {
        let cli = Cli::try_parse_from([
            "skyline-atlas", "inspect", "sprites", "--width", "256", "--depth", "alpha", "--pow2",
        ])
        .unwrap();
        let Commands::Inspect(layout) = cli.command else {
            panic!("expected inspect");
        };
        let cfg = build_config(&layout).unwrap();
        assert_eq!((cfg.width, cfg.depth, cfg.power_of_two), (256, PixelDepth::Alpha, true));

        let cli = Cli::try_parse_from([
            "skyline-atlas", "pack", "sprites", "--height", "128", "-o", "dist", "--dry-run",
        ])
        .unwrap();
        let Commands::Pack(args) = cli.command else {
            panic!("expected pack");
        };
        assert_eq!(args.layout.height, 128);
        assert_eq!(args.out_dir, PathBuf::from("dist"));
        assert!(args.dry_run);
    }
}
