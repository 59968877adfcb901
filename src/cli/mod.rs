//! Command-line parsing for `dp`.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! numeric code. Every tunable that has a sensible site-wide default can also
//! come from a `DP_*` environment variable (or a `.env` file).

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::domain::ModelSpec;
use crate::models::ModelKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dp", version, about = "Numerical data-processing helpers: smoothing, phase, resampling, curve fits")]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug). `DP_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Box-car smooth a column (appends `<column>_smoothed`).
    Smooth(SmoothArgs),
    /// Wrap a phase column into [-π, π) (appends `<column>_wrapped`).
    Wrap(ColumnArgs),
    /// Unwrap a phase column (appends `<column>_unwrapped`).
    Unwrap(ColumnArgs),
    /// Keep the values of a column within m standard deviations of its mean.
    Outliers(OutlierArgs),
    /// Count NaN values per column.
    Nan(NanArgs),
    /// Sort every column by one key column.
    Sort(SortArgs),
    /// Pick, for each target x, the source row with the nearest x.
    Downsample(DownsampleArgs),
    /// Linearly interpolate every source column onto target x values.
    Upsample(UpsampleArgs),
    /// Fit a model to table columns.
    Fit(FitArgs),
    /// Fit a seeded synthetic sample of a built-in model.
    Demo(DemoArgs),
    /// Render a display JSON written by `--export-display`.
    Plot(PlotArgs),
    /// Browse a display JSON in the terminal UI.
    View(ViewArgs),
}

/// Input table plus optional output table (stdout when omitted).
#[derive(Debug, Args, Clone)]
pub struct TableArgs {
    /// Input CSV with a header row.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Output CSV (stdout when omitted).
    #[arg(short, long, value_name = "CSV")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ColumnArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Column to transform.
    #[arg(short, long)]
    pub column: String,
}

#[derive(Debug, Args, Clone)]
pub struct SmoothArgs {
    #[command(flatten)]
    pub column: ColumnArgs,

    /// Window half-width; the window spans 2*N+1 samples.
    #[arg(long, default_value_t = crate::signal::DEFAULT_HALF_WIDTH, env = "DP_HALF_WIDTH")]
    pub half_width: usize,

    /// Reproduce the legacy edge divisors instead of averaging the clipped window.
    #[arg(long)]
    pub legacy_edges: bool,
}

#[derive(Debug, Args, Clone)]
pub struct OutlierArgs {
    #[command(flatten)]
    pub column: ColumnArgs,

    /// Keep values strictly within m population standard deviations.
    #[arg(short, long, default_value_t = crate::arrays::DEFAULT_OUTLIER_M, env = "DP_OUTLIER_M")]
    pub m: f64,
}

#[derive(Debug, Args, Clone)]
pub struct NanArgs {
    /// Input CSV with a header row.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SortArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Key column.
    #[arg(long)]
    pub by: String,
}

#[derive(Debug, Args, Clone)]
pub struct DownsampleArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// CSV holding the target x values.
    #[arg(long, value_name = "CSV")]
    pub target: PathBuf,

    /// Column of `--target` with the x values.
    #[arg(long)]
    pub target_column: String,

    /// Column of `--input` matched against the targets (defaults to `--target-column`).
    #[arg(long)]
    pub x_column: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct UpsampleArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// CSV holding the target x values.
    #[arg(long, value_name = "CSV")]
    pub target: PathBuf,

    /// Column of `--target` with the x values.
    #[arg(long)]
    pub target_column: String,

    /// Non-decreasing x column of `--input`.
    #[arg(long)]
    pub x_column: String,
}

/// Terminal plot and SVG options shared by `fit` and `demo`.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Print ASCII plots of the fit.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100, env = "DP_PLOT_WIDTH")]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25, env = "DP_PLOT_HEIGHT")]
    pub height: usize,

    /// Write each figure as an SVG into this directory.
    #[arg(long, value_name = "DIR", env = "DP_SVG_DIR")]
    pub svg_dir: Option<PathBuf>,

    /// Export parameters, R² and solver stats as JSON.
    #[arg(long, value_name = "JSON")]
    pub export_fit: Option<PathBuf>,

    /// Export the figures as display JSON (for `dp plot` / `dp view`).
    #[arg(long, value_name = "JSON")]
    pub export_display: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Input CSV with a header row.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Independent variable column (repeat for several).
    #[arg(short = 'x', long = "x", required = true, value_name = "COLUMN")]
    pub x: Vec<String>,

    /// Dependent variable column.
    #[arg(short = 'y', long = "y", value_name = "COLUMN")]
    pub y: String,

    /// Known true solution column, drawn alongside the fit.
    #[arg(long, value_name = "COLUMN")]
    pub true_column: Option<String>,

    #[arg(short, long, value_enum, default_value_t = ModelSpec::Exp, env = "DP_MODEL")]
    pub model: ModelSpec,

    /// Initial guess, comma separated (defaults to the model's guess).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub guess: Vec<f64>,

    /// Polynomial order for `--model poly`.
    #[arg(long, default_value_t = 2)]
    pub order: usize,

    /// Lower parameter bounds, comma separated (`-inf` allowed).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub lower: Vec<f64>,

    /// Upper parameter bounds, comma separated (`inf` allowed).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub upper: Vec<f64>,

    /// Solver iteration cap.
    #[arg(long, default_value_t = 200, env = "DP_MAX_ITERATIONS")]
    pub max_iterations: usize,

    /// Extra jittered starting points, fit in parallel.
    #[arg(long, default_value_t = 0, env = "DP_STARTS")]
    pub starts: usize,

    /// Seed for the jittered starts.
    #[arg(long, default_value_t = 42, env = "DP_SEED")]
    pub seed: u64,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Built-in models available to `dp demo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoModel {
    Exp,
    Cos,
    Power,
}

impl From<DemoModel> for ModelKind {
    fn from(m: DemoModel) -> Self {
        match m {
            DemoModel::Exp => ModelKind::Exponential,
            DemoModel::Cos => ModelKind::Cosine,
            DemoModel::Power => ModelKind::Power,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    #[arg(short, long, value_enum, default_value_t = DemoModel::Exp)]
    pub model: DemoModel,

    /// Number of samples.
    #[arg(short, long, default_value_t = 100)]
    pub n: usize,

    /// Standard deviation of the additive Gaussian noise.
    #[arg(long, default_value_t = 0.1)]
    pub noise: f64,

    #[arg(long, default_value_t = 42, env = "DP_SEED")]
    pub seed: u64,

    /// Also write the sample (x, y, y_true) as CSV.
    #[arg(long, value_name = "CSV")]
    pub sample_out: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Display JSON produced by `--export-display`.
    #[arg(long, value_name = "JSON")]
    pub display: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100, env = "DP_PLOT_WIDTH")]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25, env = "DP_PLOT_HEIGHT")]
    pub height: usize,

    /// Write SVGs into this directory instead of printing ASCII plots.
    #[arg(long, value_name = "DIR")]
    pub svg: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ViewArgs {
    /// Display JSON produced by `--export-display`.
    #[arg(long, value_name = "JSON")]
    pub display: PathBuf,
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
    fn fit_parses_repeated_x_and_negative_lists() {
        let cli = Cli::try_parse_from([
            "dp", "fit", "-i", "d.csv", "--x", "a", "--x", "b", "--y", "z", "--model", "power", "--guess",
            "-1,2.5,0", "--lower", "-inf,0,-10",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.x, vec!["a", "b"]);
        assert_eq!(args.model, ModelSpec::Power);
        assert_eq!(args.guess, vec![-1.0, 2.5, 0.0]);
        assert_eq!(args.lower[0], f64::NEG_INFINITY);
        assert!(args.upper.is_empty());
    }

    #[test]
    fn verbose_counts_anywhere() {
        let cli = Cli::try_parse_from(["dp", "nan", "-i", "d.csv", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
