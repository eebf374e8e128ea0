use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use roi::collection::load_geojson_collection;
use roi_mask::{
    run, BuildSettings, FillRule, ImageInfo, MaskMode, MaskOptions, MaskStack, OutputFormat,
    PreferenceStore,
};
use std::path::PathBuf;

/// Rasterize the ROIs of a GeoJSON FeatureCollection into 8-bit masks.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// GeoJSON FeatureCollection of Polygon/MultiPolygon ROIs.
    rois: PathBuf,

    /// TIFF the ROIs were drawn on, probed for dimensions and slice layout.
    #[arg(long, conflicts_with_all = ["width", "height", "slices", "slice_labels"])]
    image: Option<PathBuf>,

    #[arg(long, required_unless_present = "image")]
    width: Option<usize>,

    #[arg(long, required_unless_present = "image")]
    height: Option<usize>,

    #[arg(long, default_value_t = 1)]
    slices: usize,

    /// Image name used for the mask filename when no --image is given.
    #[arg(long)]
    name: Option<String>,

    /// Comma-separated slice labels naming the masks of a stack; leave an entry
    /// empty for `Slice <index>`.
    #[arg(long, value_delimiter = ',')]
    slice_labels: Vec<String>,

    #[arg(long, default_value_t = MaskMode::Binary)]
    mode: MaskMode,

    #[arg(long, default_value_t = FillRule::EvenOdd)]
    fill_rule: FillRule,

    /// TOML file with the options of the last run; updated with this run's options.
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Print a per-slice summary of the masks.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    show: Option<bool>,

    /// Save one mask file per slice.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    save: Option<bool>,

    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Appended to the mask filename before the extension.
    #[arg(long)]
    suffix: Option<String>,

    #[arg(long)]
    format: Option<OutputFormat>,

    /// Rasterize slices in parallel.
    #[arg(long)]
    parallel: bool,

    /// More output, repeat for debug messages.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn image_info(&self) -> Result<ImageInfo> {
        if let Some(path) = &self.image {
            return ImageInfo::probe_tiff(path);
        }
        let mut image = ImageInfo::new(
            self.width.unwrap_or_default(),
            self.height.unwrap_or_default(),
            self.slices,
        )
        .with_slice_labels(
            self.slice_labels
                .iter()
                .map(|label| (!label.is_empty()).then(|| label.clone()))
                .collect(),
        );
        if let Some(name) = &self.name {
            image = image.with_title(name.as_str());
            image.file_name = Some(name.clone());
        }
        Ok(image)
    }

    /// Stored options with the ones given on the command line applied on top.
    fn apply_to(&self, mut options: MaskOptions) -> MaskOptions {
        if let Some(show) = self.show {
            options.show = show;
        }
        if let Some(save) = self.save {
            options.save = save;
        }
        if let Some(directory) = &self.out_dir {
            options.directory.clone_from(directory);
        }
        if let Some(suffix) = &self.suffix {
            options.suffix.clone_from(suffix);
        }
        if let Some(format) = self.format {
            options.extension = format;
        }
        options
    }
}

fn print_summary(stack: &MaskStack) {
    for (slice_index, mask) in stack.iter() {
        let counts = mask.label_counts();
        if counts.is_empty() {
            println!("slice {slice_index}: background only");
            continue;
        }
        let labels: Vec<_> = counts
            .iter()
            .map(|(label, n)| format!("{label}: {n} px"))
            .collect();
        println!("slice {slice_index}: {}", labels.join(", "));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        })
        .format_timestamp(None)
        .init();

    let store = cli.prefs.as_ref().map(PreferenceStore::new);
    let stored = match &store {
        Some(store) => store.load()?,
        None => MaskOptions::default(),
    };
    let options = cli.apply_to(stored);

    let rois = load_geojson_collection(&cli.rois)
        .with_context(|| format!("Failed to load ROIs from {:?}", cli.rois))?;
    let image = cli.image_info()?;
    info!(
        "{} ROI(s) on a {}x{} image with {} slice(s)",
        rois.len(),
        image.width,
        image.height,
        image.slice_count()
    );

    let settings = BuildSettings {
        mode: cli.mode,
        fill_rule: cli.fill_rule,
        parallel: cli.parallel,
    };
    let outcome = run(&rois, &image, &options, &settings)?;

    if let Some(stack) = &outcome.shown {
        print_summary(stack);
    }
    for path in &outcome.saved {
        println!("{}", path.display());
    }
    if let Some(store) = &store {
        store.store(&options)?;
    }
    Ok(())
}
