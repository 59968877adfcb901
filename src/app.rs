//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments
//! - runs table transforms and fits
//! - prints reports/plots
//! - writes optional exports

use std::path::Path;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::arrays::{downsample, reject_outliers, sort_parallel_arrays, upsample};
use crate::cli::{
    Cli, ColumnArgs, Command, DemoArgs, DownsampleArgs, FitArgs, NanArgs, OutlierArgs, PlotArgs,
    SmoothArgs, SortArgs, UpsampleArgs, ViewArgs,
};
use crate::data::{demo_setup, generate};
use crate::domain::{Bounds, DisplayRequest, FitConfig, ModelSpec, SolverOptions};
use crate::error::AppError;
use crate::io::{ColumnTable, FitExport, read_display_json, write_display_json, write_fit_json};
use crate::models::ModelKind;
use crate::plot::{AsciiRenderer, Renderer, SvgRenderer};
use crate::signal::{EdgeMode, boxcar_smooth, unwrap_phase, wrap_phase};

pub mod pipeline;

use pipeline::{FitData, RunOutput};

/// SVG canvas size in pixels.
const SVG_SIZE: (u32, u32) = (800, 600);

/// Entry point for the `dp` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is fine.
    let _ = dotenvy::dotenv();

    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Smooth(args) => handle_smooth(args),
        Command::Wrap(args) => handle_phase(args, PhaseOp::Wrap),
        Command::Unwrap(args) => handle_phase(args, PhaseOp::Unwrap),
        Command::Outliers(args) => handle_outliers(args),
        Command::Nan(args) => handle_nan(args),
        Command::Sort(args) => handle_sort(args),
        Command::Downsample(args) => handle_downsample(args),
        Command::Upsample(args) => handle_upsample(args),
        Command::Fit(args) => handle_fit(args),
        Command::Demo(args) => handle_demo(args),
        Command::Plot(args) => handle_plot(args),
        Command::View(args) => handle_view(args),
    }
}

/// Logs go to stderr so stdout stays clean for CSV output.
fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("DP_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_smooth(args: SmoothArgs) -> Result<(), AppError> {
    let edges = if args.legacy_edges { EdgeMode::Legacy } else { EdgeMode::Clipped };
    append_column(&args.column, "smoothed", |data| boxcar_smooth(data, args.half_width, edges))
}

#[derive(Debug, Clone, Copy)]
enum PhaseOp {
    Wrap,
    Unwrap,
}

fn handle_phase(args: ColumnArgs, op: PhaseOp) -> Result<(), AppError> {
    match op {
        PhaseOp::Wrap => append_column(&args, "wrapped", wrap_phase),
        PhaseOp::Unwrap => append_column(&args, "unwrapped", unwrap_phase),
    }
}

/// Read the table, transform one column, write the table with the result
/// appended as `<column>_<suffix>`.
fn append_column(args: &ColumnArgs, suffix: &str, op: impl Fn(&[f64]) -> Vec<f64>) -> Result<(), AppError> {
    let table = ColumnTable::read_csv(&args.table.input)?;
    let out = op(table.column(&args.column)?);

    let mut headers = table.headers().to_vec();
    let mut columns = table.columns().to_vec();
    headers.push(format!("{}_{suffix}", args.column));
    columns.push(out);
    ColumnTable::new(headers, columns)?.write_csv(args.table.output.as_deref())
}

fn handle_outliers(args: OutlierArgs) -> Result<(), AppError> {
    let table = ColumnTable::read_csv(&args.column.table.input)?;
    let data = table.column(&args.column.column)?;
    let kept = reject_outliers(data, args.m);
    info!(kept = kept.len(), removed = data.len() - kept.len(), m = args.m, "outlier rejection");

    ColumnTable::new(vec![args.column.column.clone()], vec![kept])?
        .write_csv(args.column.table.output.as_deref())
}

fn handle_nan(args: NanArgs) -> Result<(), AppError> {
    let table = ColumnTable::read_csv(&args.input)?;
    print!("{}", crate::report::format_column_summary(&table));
    Ok(())
}

fn handle_sort(args: SortArgs) -> Result<(), AppError> {
    let table = ColumnTable::read_csv(&args.table.input)?;
    let key = table.index_of(&args.by)?;
    let sorted = sort_parallel_arrays(table.columns(), key)?;
    ColumnTable::new(table.headers().to_vec(), sorted)?.write_csv(args.table.output.as_deref())
}

fn handle_downsample(args: DownsampleArgs) -> Result<(), AppError> {
    let source = ColumnTable::read_csv(&args.table.input)?;
    let target = ColumnTable::read_csv(&args.target)?;
    let target_x = target.column(&args.target_column)?;
    let x_name = args.x_column.as_deref().unwrap_or(&args.target_column);

    let picked = downsample(target_x, source.columns(), source.index_of(x_name)?)?;
    ColumnTable::new(source.headers().to_vec(), picked)?.write_csv(args.table.output.as_deref())
}

fn handle_upsample(args: UpsampleArgs) -> Result<(), AppError> {
    let source = ColumnTable::read_csv(&args.table.input)?;
    let target = ColumnTable::read_csv(&args.target)?;
    let target_x = target.column(&args.target_column)?;
    let x_idx = source.index_of(&args.x_column)?;
    let source_x = &source.columns()[x_idx];

    let mut headers = vec![args.x_column.clone()];
    let mut columns = vec![target_x.to_vec()];
    for (i, (name, col)) in source.headers().iter().zip(source.columns()).enumerate() {
        if i == x_idx {
            continue;
        }
        headers.push(name.clone());
        columns.push(upsample(target_x, source_x, col)?);
    }
    ColumnTable::new(headers, columns)?.write_csv(args.table.output.as_deref())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args)?;
    let run = pipeline::run_fit(&config)?;
    present_run(&run, &config)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let kind = ModelKind::from(args.model);
    let setup = demo_setup(kind);
    let sample = generate(kind, &setup.params, setup.x_range, args.n, args.noise, args.seed)?;
    debug!(truth = ?setup.params, "demo sample");

    if let Some(path) = &args.sample_out {
        ColumnTable::new(
            vec!["x".into(), "y".into(), "y_true".into()],
            vec![sample.x.clone(), sample.y.clone(), sample.y_true.clone()],
        )?
        .write_csv(Some(path.as_path()))?;
    }

    let config = FitConfig {
        input: Default::default(),
        x_columns: vec!["x".to_string()],
        y_column: "y".to_string(),
        true_column: Some("y_true".to_string()),
        model: match kind {
            ModelKind::Exponential => ModelSpec::Exp,
            ModelKind::Cosine => ModelSpec::Cos,
            ModelKind::Power => ModelSpec::Power,
        },
        guess: Some(setup.guess),
        order: 2,
        bounds: None,
        solver: SolverOptions::default(),
        starts: 0,
        seed: args.seed,
        plot: args.output.plot,
        plot_width: args.output.width,
        plot_height: args.output.height,
        svg_dir: args.output.svg_dir.clone(),
        export_fit: args.output.export_fit.clone(),
        export_display: args.output.export_display.clone(),
    };
    let data = FitData {
        x: vec![sample.x],
        y: sample.y,
        y_true: Some(sample.y_true),
    };
    let run = pipeline::fit_data(&config, &data)?;
    println!("True parameters: {:?}", setup.params);
    present_run(&run, &config)
}

/// Print the summary and plots, then write SVGs and exports.
fn present_run(run: &RunOutput, config: &FitConfig) -> Result<(), AppError> {
    match &run.poly {
        Some(poly) => println!("{}", crate::report::format_poly_summary(poly)),
        None => println!(
            "{}",
            crate::report::format_fit_summary(
                &run.model,
                &run.result,
                run.report.as_ref(),
                run.starts,
                run.failed_starts,
            )
        ),
    }

    if config.plot {
        let mut ascii = AsciiRenderer::new(std::io::stdout().lock(), config.plot_width, config.plot_height);
        ascii.render_all(&run.displays)?;
    }
    if let Some(dir) = &config.svg_dir {
        render_svgs(dir, &run.displays)?;
    }

    if let Some(path) = &config.export_fit {
        let export = FitExport::new(run.model.clone(), run.result.clone(), run.report.as_ref());
        write_fit_json(path, &export)?;
    }
    if let Some(path) = &config.export_display {
        write_display_json(path, &run.displays)?;
    }
    Ok(())
}

fn render_svgs(dir: &Path, displays: &[DisplayRequest]) -> Result<(), AppError> {
    let mut svg = SvgRenderer::new(Some(dir.to_path_buf()), SVG_SIZE.0, SVG_SIZE.1);
    svg.render_all(displays)?;
    for p in svg.written() {
        println!("Wrote {}", p.display());
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let displays = read_display_json(&args.display)?;
    match &args.svg {
        Some(dir) => render_svgs(dir, &displays),
        None => AsciiRenderer::new(std::io::stdout().lock(), args.width, args.height).render_all(&displays),
    }
}

fn handle_view(args: ViewArgs) -> Result<(), AppError> {
    let displays = read_display_json(&args.display)?;
    crate::tui::run(displays)
}

pub fn fit_config_from_args(args: &FitArgs) -> Result<FitConfig, AppError> {
    Ok(FitConfig {
        input: args.input.clone(),
        x_columns: args.x.clone(),
        y_column: args.y.clone(),
        true_column: args.true_column.clone(),
        model: args.model,
        guess: (!args.guess.is_empty()).then(|| args.guess.clone()),
        order: args.order,
        bounds: bounds_from_args(&args.lower, &args.upper)?,
        solver: SolverOptions {
            max_iterations: args.max_iterations,
            ..SolverOptions::default()
        },
        starts: args.starts,
        seed: args.seed,
        plot: args.output.plot,
        plot_width: args.output.width,
        plot_height: args.output.height,
        svg_dir: args.output.svg_dir.clone(),
        export_fit: args.output.export_fit.clone(),
        export_display: args.output.export_display.clone(),
    })
}

/// A missing side of the box is unbounded.
fn bounds_from_args(lower: &[f64], upper: &[f64]) -> Result<Option<Bounds>, AppError> {
    match (lower.is_empty(), upper.is_empty()) {
        (true, true) => Ok(None),
        (false, true) => Ok(Some(Bounds::new(lower.to_vec(), vec![f64::INFINITY; lower.len()]))),
        (true, false) => Ok(Some(Bounds::new(vec![f64::NEG_INFINITY; upper.len()], upper.to_vec()))),
        (false, false) if lower.len() == upper.len() => Ok(Some(Bounds::new(lower.to_vec(), upper.to_vec()))),
        (false, false) => Err(AppError::new(
            2,
            format!("--lower has {} values, --upper has {}", lower.len(), upper.len()),
        )),
    }
}

/// Rewrite argv so `dp figures.json` means `dp view --display figures.json`.
///
/// Rules:
/// - `dp X.json`                -> `dp view --display X.json`
/// - anything else              -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1) else {
        return argv;
    };
    if argv.len() == 2 && !arg1.starts_with('-') && arg1.ends_with(".json") {
        argv.insert(1, "--display".to_string());
        argv.insert(1, "view".to_string());
    }
    argv
}
