/// vprdb
///
/// 读取数据集, 压缩后导出, 或评价压缩结果.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use vprdb_rs::cache::CoverageMatrixCache;
use vprdb_rs::config::{
    RunConfig, COVERAGE_THRESHOLD, DEFAULT_VOXEL_SIZE, DOMINATING_SET_THRESHOLD, DOWN_SAMPLE_STEP,
    SET_COVER_VOXEL_SIZE,
};
use vprdb_rs::dataset::{DatasetTrait, DefaultDataset};
use vprdb_rs::metrics::{
    recall, FramesCoverage, NotCoveredFrames, ReductionMetric, SpatialCoverage,
};
use vprdb_rs::reduction_methods::{
    CubeDivision, DistanceVector, DominatingSet, EveryNth, ReductionMethod, SetCover,
};
use vprdb_rs::{coverage, Database, VoxelGrid};

#[derive(Parser, Debug)]
#[command(name = "vprdb", version, about = "VPR database reduction")]
struct Cli {
    /// JSON run configuration.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reduce a dataset and export the result.
    Reduce {
        dataset: PathBuf,
        #[arg(long, value_enum)]
        method: Method,
        /// Voxel size for set cover and dominating set.
        #[arg(long)]
        voxel_size: Option<f64>,
        /// Frame budget of set cover.
        #[arg(long)]
        frames: Option<usize>,
        /// IoU threshold of dominating set.
        #[arg(long, default_value_t = DOMINATING_SET_THRESHOLD)]
        threshold: f64,
        /// Step of every-nth.
        #[arg(long, default_value_t = 5)]
        n: usize,
        /// Distance threshold of distance-vector.
        #[arg(long, default_value_t = 1.0)]
        distance: f64,
        /// Cube size of cube-division.
        #[arg(long, default_value_t = 1.0)]
        cube_size: f64,
        #[arg(long, value_name = "DIR")]
        output: PathBuf,
    },
    /// Compare a reduced dataset with its original.
    Evaluate {
        original: PathBuf,
        reduced: PathBuf,
        #[arg(long, default_value_t = DEFAULT_VOXEL_SIZE)]
        voxel_size: f64,
        /// Coverage threshold for recall and not covered frames.
        #[arg(long, default_value_t = COVERAGE_THRESHOLD)]
        threshold: f64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum Method {
    SetCover,
    DominatingSet,
    EveryNth,
    DistanceVector,
    CubeDivision,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

#[derive(Debug, Serialize)]
struct EvaluationReport {
    original_frames: usize,
    reduced_frames: usize,
    spatial_coverage: f64,
    mean_frames_coverage: f64,
    min_frames_coverage: f64,
    not_covered_frames: usize,
    recall: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::builder()
        .filter_level(cli.log_level.into())
        .format_timestamp_nanos()
        .init();

    let config = match &cli.config {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {path:?}"))?,
        None => RunConfig::default(),
    };
    if let Some(num_threads) = config.num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .context("failed to configure worker pool")?;
    }

    match cli.command {
        Command::Reduce {
            dataset,
            method,
            voxel_size,
            frames,
            threshold,
            n,
            distance,
            cube_size,
            output,
        } => {
            let db = read_database(&dataset, &config)?;
            let cache = Arc::new(load_cache(config.cache_snapshot.as_deref())?);
            let reduced = match method {
                Method::SetCover => SetCover::new(voxel_size.unwrap_or(SET_COVER_VOXEL_SIZE), frames)?
                    .with_cache(cache.clone())
                    .reduce(&db)?,
                Method::DominatingSet => {
                    DominatingSet::new(threshold, voxel_size.unwrap_or(DEFAULT_VOXEL_SIZE))?
                        .with_cache(cache.clone())
                        .reduce(&db)?
                }
                Method::EveryNth => EveryNth::new(n)?.reduce(&db)?,
                Method::DistanceVector => DistanceVector::new(distance)?.reduce(&db)?,
                Method::CubeDivision => CubeDivision::new(cube_size)?.reduce(&db)?,
            };
            if let Some(path) = &config.cache_snapshot {
                cache
                    .save_json(path)
                    .with_context(|| format!("failed to save cache {path:?}"))?;
            }
            vprdb_rs::save::export_database(&reduced, &output, &config.layout)
                .with_context(|| format!("failed to export to {output:?}"))?;
            log::info!("reduced {} -> {} frames", db.len(), reduced.len());
        }
        Command::Evaluate {
            original,
            reduced,
            voxel_size,
            threshold,
        } => {
            let original = read_database(&original, &config)?;
            let reduced = read_database(&reduced, &config)?;
            let report = evaluate(&original, &reduced, voxel_size, threshold)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn read_database(path: &Path, config: &RunConfig) -> anyhow::Result<Database> {
    let dataset = DefaultDataset::new(path, &config.layout)
        .with_context(|| format!("failed to read dataset {path:?}"))?;
    Ok(dataset.to_database()?)
}

fn load_cache(path: Option<&Path>) -> anyhow::Result<CoverageMatrixCache> {
    match path {
        Some(path) if path.exists() => CoverageMatrixCache::load_json(path)
            .with_context(|| format!("failed to load cache {path:?}")),
        _ => Ok(CoverageMatrixCache::new()),
    }
}

fn evaluate(
    original: &Database,
    reduced: &Database,
    voxel_size: f64,
    threshold: f64,
) -> anyhow::Result<EvaluationReport> {
    let spatial = SpatialCoverage::new(voxel_size, DOWN_SAMPLE_STEP)?.evaluate(original, reduced)?;
    let frames = FramesCoverage::new(voxel_size)?.evaluate(original, reduced)?;
    let not_covered = NotCoveredFrames::new(threshold, voxel_size)?.evaluate(original, reduced)?;

    // 用覆盖率最高的帧作为检索结果
    let grid = VoxelGrid::from_bounds(&original.bounds()?, voxel_size)?;
    let matches = coverage::match_two_databases(original, reduced, &grid)?;
    let recall_value = recall(reduced, original, &matches, voxel_size, threshold)?;

    let mean = frames.iter().sum::<f64>() / frames.len().max(1) as f64;
    let min = frames.iter().copied().fold(f64::INFINITY, f64::min);
    Ok(EvaluationReport {
        original_frames: original.len(),
        reduced_frames: reduced.len(),
        spatial_coverage: spatial,
        mean_frames_coverage: mean,
        min_frames_coverage: min,
        not_covered_frames: not_covered,
        recall: recall_value,
    })
}
