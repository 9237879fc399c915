use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fuzzyview", version, about = "Fuzzy viewshed calculator")]
pub struct CliArgs {
    /// Input DEM (any GDAL-readable raster)
    #[arg(long)]
    pub dem: PathBuf,

    /// Observer features (shapefile, geopackage, ...): points, polygons or multipolygons
    #[arg(long)]
    pub features: PathBuf,

    /// Output directory for per-feature rasters and the batch report
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// JSON preset with viewshed parameters; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Full-confidence radius (terrain units)
    #[arg(long, allow_negative_numbers = true)]
    pub b1: Option<f64>,

    /// Observer height above ground (terrain units)
    #[arg(long, allow_negative_numbers = true)]
    pub observer_height: Option<f64>,

    /// Maximum distance; cells beyond it are written as nodata
    #[arg(long, allow_negative_numbers = true)]
    pub max_distance: Option<f64>,

    /// Scale factor on the resolvable distance (calibrated at 1)
    #[arg(long, allow_negative_numbers = true)]
    pub visual_arc: Option<f64>,

    /// Object width to resolvable distance ratio
    #[arg(long, allow_negative_numbers = true)]
    pub distance_multiplier: Option<f64>,

    /// Attribute holding the feature identifier
    #[arg(long)]
    pub id_field: Option<String>,

    /// Output file name prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Worker threads for processing features in parallel
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Per-feature visibility engine timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Abort on the first failed feature
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Path to the WhiteboxTools executable
    #[arg(long, default_value = "whitebox_tools")]
    pub whitebox: PathBuf,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
