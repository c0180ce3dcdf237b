use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::imageops::FilterType;
use tracing_subscriber::EnvFilter;

use plategen::{
    ConfigStore, DEFAULT_EXPORT_FILE, Design, ExportFormat, MAX_PLATES, MotifSource,
    PlateDimension, RenderOpts, Unit, format_value, parse_dimension,
};

#[derive(Parser, Debug)]
#[command(
    name = "plategen",
    version,
    about = "Configure wall plates and export the motif design"
)]
struct Cli {
    /// Design file (defaults to the user config directory).
    #[arg(long, global = true, env = "PLATEGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current plates, unit and motif.
    Show,
    /// Append default-sized plates.
    Add {
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Remove a plate by id or `#position`.
    Remove { plate: String },
    /// Change a plate's size, in the current unit.
    Set(SetArgs),
    /// Move the plate at position FROM to position TO (1-based).
    Move { from: usize, to: usize },
    /// Switch the display/input unit.
    Unit { unit: UnitArg },
    /// Choose the motif image.
    Motif(MotifArgs),
    /// Render the design and write it as an image.
    Export(ExportArgs),
    /// Render a downscaled preview image.
    Preview(PreviewArgs),
    /// Discard the stored design.
    Reset,
}

#[derive(Args, Debug)]
struct SetArgs {
    /// Plate id or `#position`.
    plate: String,

    #[arg(long)]
    width: Option<String>,

    #[arg(long)]
    height: Option<String>,
}

#[derive(Args, Debug)]
struct MotifArgs {
    /// Local image path or http(s) URL.
    #[arg(required_unless_present = "reset")]
    source: Option<String>,

    /// Inline a local file into the design as a data URL.
    #[arg(long)]
    embed: bool,

    /// Go back to the default motif.
    #[arg(long, conflicts_with_all = ["source", "embed"])]
    reset: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Border thickness in pixels (0 disables borders).
    #[arg(long, default_value_t = 1)]
    border: u32,

    /// Resampling filter used when scaling the motif.
    #[arg(long, value_enum, default_value_t = FilterArg::CatmullRom)]
    filter: FilterArg,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Output image path [default: plate-design.png, or .jpg with `--format jpeg`].
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output format; inferred from the extension when omitted.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Pixels per centimetre.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    #[arg(long, default_value = "plate-preview.png")]
    out: PathBuf,

    /// Maximum preview width in pixels.
    #[arg(long, default_value_t = 1200)]
    max_width: u32,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum UnitArg {
    Cm,
    In,
}

impl From<UnitArg> for Unit {
    fn from(u: UnitArg) -> Self {
        match u {
            UnitArg::Cm => Unit::Cm,
            UnitArg::In => Unit::In,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
}

impl From<FormatArg> for ExportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Png => ExportFormat::Png,
            FormatArg::Jpeg => ExportFormat::Jpeg,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FilterArg {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<FilterArg> for FilterType {
    fn from(f: FilterArg) -> Self {
        match f {
            FilterArg::Nearest => FilterType::Nearest,
            FilterArg::Triangle => FilterType::Triangle,
            FilterArg::CatmullRom => FilterType::CatmullRom,
            FilterArg::Gaussian => FilterType::Gaussian,
            FilterArg::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let path = match &cli.config {
        Some(p) => p.clone(),
        None => ConfigStore::default_path()?,
    };
    let store = ConfigStore::new(path);

    match cli.cmd {
        Command::Show => cmd_show(&store),
        Command::Add { count } => cmd_add(&store, count),
        Command::Remove { plate } => cmd_remove(&store, &plate),
        Command::Set(args) => cmd_set(&store, args),
        Command::Move { from, to } => cmd_move(&store, from, to),
        Command::Unit { unit } => cmd_unit(&store, unit.into()),
        Command::Motif(args) => cmd_motif(&store, args),
        Command::Export(args) => cmd_export(&store, args),
        Command::Preview(args) => cmd_preview(&store, args),
        Command::Reset => {
            store.clear()?;
            eprintln!("cleared {}", store.path().display());
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_show(store: &ConfigStore) -> anyhow::Result<()> {
    let design = store.load();
    print_design(&design);
    println!("config: {}", store.path().display());
    Ok(())
}

fn print_design(design: &Design) {
    let unit = design.unit;
    for (i, p) in design.plates.iter().enumerate() {
        println!(
            "#{:<2} {:<10} {} x {} {unit}",
            i + 1,
            p.id,
            format_value(p.width, unit),
            format_value(p.height, unit),
        );
    }
    println!(
        "total: {} x {} {unit} ({} plates)",
        format_value(design.total_width(), unit),
        format_value(design.max_height(), unit),
        design.plates.len()
    );
    println!("motif: {}", design.motif.describe());
}

fn cmd_add(store: &ConfigStore, count: usize) -> anyhow::Result<()> {
    let mut design = store.load();
    let mut added = 0;
    for _ in 0..count {
        match design.add_plate() {
            Some(p) => {
                eprintln!("added plate {}", p.id);
                added += 1;
            }
            None => {
                eprintln!("design already has the maximum of {MAX_PLATES} plates");
                break;
            }
        }
    }
    if added > 0 {
        store.save(&design)?;
    }
    Ok(())
}

fn cmd_remove(store: &ConfigStore, selector: &str) -> anyhow::Result<()> {
    let mut design = store.load();
    let idx = design.locate(selector)?;
    let id = design.plates[idx].id.clone();
    if design.remove_plate(&id)? {
        store.save(&design)?;
        eprintln!("removed plate {id}");
    } else {
        eprintln!("cannot remove the last plate");
    }
    Ok(())
}

fn cmd_set(store: &ConfigStore, args: SetArgs) -> anyhow::Result<()> {
    if args.width.is_none() && args.height.is_none() {
        anyhow::bail!("nothing to change: pass --width and/or --height");
    }

    let mut design = store.load();
    let idx = design.locate(&args.plate)?;
    let id = design.plates[idx].id.clone();
    let unit = design.unit;

    for (dim, raw) in [
        (PlateDimension::Width, args.width.as_deref()),
        (PlateDimension::Height, args.height.as_deref()),
    ] {
        let Some(raw) = raw else {
            continue;
        };
        let (min, max) = dim.limits_cm();
        let cm = parse_dimension(raw, unit, min, max)
            .with_context(|| format!("invalid {} '{raw}'", dim.label()))?;
        design.update_dimension(&id, dim, cm)?;
    }

    store.save(&design)?;
    let p = &design.plates[idx];
    eprintln!(
        "plate {id} is now {} x {} {unit}",
        format_value(p.width, unit),
        format_value(p.height, unit)
    );
    Ok(())
}

fn cmd_move(store: &ConfigStore, from: usize, to: usize) -> anyhow::Result<()> {
    if from == 0 || to == 0 {
        anyhow::bail!("positions are 1-based");
    }
    let mut design = store.load();
    design.reorder(from - 1, to - 1)?;
    store.save(&design)?;
    print_design(&design);
    Ok(())
}

fn cmd_unit(store: &ConfigStore, unit: Unit) -> anyhow::Result<()> {
    let mut design = store.load();
    design.unit = unit;
    store.save(&design)?;
    eprintln!("unit set to {unit}");
    Ok(())
}

fn cmd_motif(store: &ConfigStore, args: MotifArgs) -> anyhow::Result<()> {
    let mut design = store.load();

    design.motif = match (args.reset, args.source) {
        (true, _) | (false, None) => MotifSource::Default,
        (false, Some(source)) => match MotifSource::parse(&source) {
            MotifSource::Path(p) => {
                let abs = std::path::absolute(&p)
                    .with_context(|| format!("resolve motif path '{}'", p.display()))?;
                if args.embed {
                    MotifSource::embed_file(&abs)?
                } else {
                    let src = MotifSource::Path(abs);
                    src.load(Path::new("."))?;
                    src
                }
            }
            other if args.embed => {
                anyhow::bail!("--embed only applies to local files, got {}", other.describe())
            }
            other => other,
        },
    };

    store.save(&design)?;
    eprintln!("motif: {}", design.motif.describe());
    Ok(())
}

fn render_opts(args: &RenderArgs, px_per_cm: f64) -> RenderOpts {
    RenderOpts {
        px_per_cm,
        border_px: args.border,
        filter: args.filter.into(),
        ..RenderOpts::default()
    }
}

/// Relative motif paths in the design file are relative to that file.
fn motif_base_dir(store: &ConfigStore) -> &Path {
    store
        .path()
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn cmd_export(store: &ConfigStore, args: ExportArgs) -> anyhow::Result<()> {
    let design = store.load();
    let opts = render_opts(&args.render, args.scale);
    let format: Option<ExportFormat> = args.format.map(Into::into);
    let out = args.out.unwrap_or_else(|| {
        Path::new(DEFAULT_EXPORT_FILE).with_extension(format.unwrap_or_default().extension())
    });
    let summary =
        plategen::export_design(&design, motif_base_dir(store), &opts, &out, format)
            .with_context(|| format!("export '{}'", out.display()))?;

    eprintln!(
        "wrote {} ({}x{} px, {} bytes)",
        summary.path.display(),
        summary.width,
        summary.height,
        summary.bytes
    );
    Ok(())
}

fn cmd_preview(store: &ConfigStore, args: PreviewArgs) -> anyhow::Result<()> {
    let design = store.load();
    let opts = plategen::preview_opts(&design, args.max_width, render_opts(&args.render, 1.0));
    let summary =
        plategen::export_design(&design, motif_base_dir(store), &opts, &args.out, None)
            .with_context(|| format!("preview '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}x{} px)",
        summary.path.display(),
        summary.width,
        summary.height
    );
    Ok(())
}
