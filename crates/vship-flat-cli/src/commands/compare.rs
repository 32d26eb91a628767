//! Score a distorted clip against its reference on the GPU.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;
use tracing::{debug, info};
use vship_flat::metrics::butteraugli::{DEFAULT_DISPLAY_NITS, DEFAULT_QNORM};
use vship_flat::{
    ButteraugliHandler, Colorspace, CvvdpHandler, CvvdpOptions, DisplayModel, Metric, Native,
    PerceptionLevel, Planes, Ssimu2Handler, Vship,
};

use super::stats::{Summary, pairwise_correlations};
use super::yuv::{YuvFile, frame_span};

/// Key the display model built from the display flags is registered under.
const CUSTOM_DISPLAY: &str = "Custom";

#[derive(Args)]
pub struct CompareArgs {
    /// Reference .yuv file
    pub reference: PathBuf,

    /// Distorted .yuv file
    pub distorted: PathBuf,

    /// Metrics to run, comma separated (ssimu2, butteraugli, cvvdp)
    #[arg(short, long, value_delimiter = ',', default_value = "ssimu2")]
    pub metrics: Vec<Metric>,

    /// Frame width in pixels
    #[arg(long)]
    pub width: u32,

    /// Frame height in pixels
    #[arg(long)]
    pub height: u32,

    /// First reference frame to score
    #[arg(long, default_value_t = 0)]
    pub aidx: usize,

    /// First distorted frame to score
    #[arg(long, default_value_t = 0)]
    pub bidx: usize,

    /// Number of frames to score (all remaining if omitted)
    #[arg(long)]
    pub frames: Option<usize>,

    /// Butteraugli Q-norm
    #[arg(long, default_value_t = DEFAULT_QNORM)]
    pub butter_qnorm: i32,

    #[command(flatten)]
    pub display: DisplayArgs,

    /// CVVDP frame rate
    #[arg(long, default_value_t = 24.0)]
    pub fps: f32,

    /// Score CVVDP frames independently, dropping temporal history
    #[arg(long)]
    pub cvvdp_spatial: bool,

    /// Resample frames to the display resolution for CVVDP
    #[arg(long)]
    pub cvvdp_resize: bool,

    /// Output JSON file with per-frame scores
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// CVVDP display selection. Any of the custom flags turns the `--display`
/// preset into a modified copy.
#[derive(Args)]
pub struct DisplayArgs {
    /// CVVDP display model key
    #[arg(long, default_value = "standard_fhd")]
    pub display: String,

    /// Display horizontal resolution
    #[arg(long)]
    pub display_width: Option<u32>,

    /// Display vertical resolution
    #[arg(long)]
    pub display_height: Option<u32>,

    /// Display diagonal in inches
    #[arg(long)]
    pub display_diagonal: Option<f32>,

    /// Viewing distance in meters
    #[arg(long)]
    pub viewing_distance: Option<f32>,

    /// Display contrast ratio, e.g. 1000 for 1000:1
    #[arg(long)]
    pub display_ratio: Option<u32>,

    /// Ambient room illumination in lux
    #[arg(long)]
    pub room_lux: Option<u32>,

    /// Display peak luminance in nits (also used by Butteraugli)
    #[arg(long)]
    pub display_nits: Option<f32>,
}

impl DisplayArgs {
    /// The `--display` preset with the custom flags applied, or `None` when
    /// no custom flag is set.
    fn custom_model(&self) -> Result<Option<DisplayModel>> {
        let custom = self.display_width.is_some()
            || self.display_height.is_some()
            || self.display_diagonal.is_some()
            || self.viewing_distance.is_some()
            || self.display_ratio.is_some()
            || self.room_lux.is_some()
            || self.display_nits.is_some();
        if !custom {
            return Ok(None);
        }
        let Some(mut model) = DisplayModel::preset(&self.display) else {
            bail!(
                "Display flags modify a preset, and '{}' is not one (expected one of: {})",
                self.display,
                DisplayModel::PRESET_KEYS.join(", ")
            );
        };

        model.name = format!("{} (modified)", self.display);
        if let Some(width) = self.display_width {
            model.width = width;
        }
        if let Some(height) = self.display_height {
            model.height = height;
        }
        if let Some(diagonal) = self.display_diagonal {
            model.diagonal_size_inches = diagonal;
        }
        if let Some(distance) = self.viewing_distance {
            model.viewing_distance_meters = distance;
        }
        if let Some(ratio) = self.display_ratio {
            model.contrast_ratio = ratio;
        }
        if let Some(lux) = self.room_lux {
            model.ambient_lux = lux;
        }
        if let Some(nits) = self.display_nits {
            model.max_luminance = nits;
        }
        Ok(Some(model))
    }
}

/// One open handler per requested metric.
enum Scorer<'v> {
    Ssimu2(Ssimu2Handler<'v, Native>),
    Butteraugli(ButteraugliHandler<'v, Native>),
    Cvvdp {
        handler: CvvdpHandler<'v, Native>,
        spatial: bool,
    },
}

impl<'v> Scorer<'v> {
    fn open(vship: &'v Vship<Native>, metric: Metric, cs: &Colorspace, args: &CompareArgs) -> Result<Self> {
        let scorer = match metric {
            Metric::Ssimu2 => Self::Ssimu2(vship.ssimu2(cs, cs)?),
            Metric::Butteraugli => {
                let nits = args.display.display_nits.unwrap_or(DEFAULT_DISPLAY_NITS);
                Self::Butteraugli(vship.butteraugli(cs, cs, args.butter_qnorm, nits)?)
            }
            Metric::Cvvdp => {
                let options = CvvdpOptions {
                    fps: args.fps,
                    resize_to_display: args.cvvdp_resize,
                };
                let handler = match args.display.custom_model()? {
                    Some(model) => {
                        debug!("CVVDP display: {:?}", model);
                        let models = BTreeMap::from([(CUSTOM_DISPLAY.to_string(), model)]);
                        CvvdpHandler::with_display_models(vship, cs, cs, options, CUSTOM_DISPLAY, &models)?
                    }
                    None => vship.cvvdp(cs, cs, options, &args.display.display)?,
                };
                Self::Cvvdp {
                    handler,
                    spatial: args.cvvdp_spatial,
                }
            }
        };
        Ok(scorer)
    }

    fn score(&mut self, reference: &Planes<'_>, distorted: &Planes<'_>) -> Result<f64> {
        let score = match self {
            Self::Ssimu2(handler) => handler.compute_score(reference, distorted)?,
            Self::Butteraugli(handler) => handler.compute_score(reference, distorted)?.norm_q,
            Self::Cvvdp { handler, spatial } => {
                // Per-frame scores: the accumulator restarts every frame, the
                // temporal history only in spatial mode.
                if *spatial {
                    handler.reset()?;
                }
                handler.reset_score()?;
                handler.compute_score(reference, distorted)?
            }
        };
        Ok(score)
    }

    fn close(self) -> Result<()> {
        match self {
            Self::Ssimu2(handler) => handler.close()?,
            Self::Butteraugli(handler) => handler.close()?,
            Self::Cvvdp { handler, .. } => handler.close()?,
        }
        Ok(())
    }
}

/// Results written with `--output`.
#[derive(Debug, Serialize)]
struct CompareReport {
    width: u32,
    height: u32,
    aidx: usize,
    bidx: usize,
    frames: usize,
    metrics: Vec<MetricReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    correlations: Vec<Correlation>,
}

#[derive(Debug, Serialize)]
struct MetricReport {
    metric: Metric,
    scores: Vec<f64>,
    summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    perception: Option<PerceptionLevel>,
}

/// Absolute Pearson correlation between two metrics' per-frame scores.
#[derive(Debug, Serialize)]
struct Correlation {
    first: Metric,
    second: Metric,
    r: f64,
}

pub fn run(args: &CompareArgs, gpu: Option<i32>) -> Result<()> {
    let mut metrics: Vec<Metric> = Vec::with_capacity(args.metrics.len());
    for &metric in &args.metrics {
        if !metrics.contains(&metric) {
            metrics.push(metric);
        }
    }
    if metrics.is_empty() {
        bail!("At least one metric is required");
    }

    let reference = YuvFile::open(&args.reference, args.width, args.height)?;
    let distorted = YuvFile::open(&args.distorted, args.width, args.height)?;
    let frames = frame_span(
        reference.frame_count(),
        distorted.frame_count(),
        args.aidx,
        args.bidx,
        args.frames,
    )?;
    info!(
        "Comparing {} frames (reference from {}, distorted from {}) with {:?}",
        frames, args.aidx, args.bidx, metrics
    );

    let vship = Vship::native();
    if let Some(gpu) = gpu {
        vship.set_device(gpu).with_context(|| format!("Failed to select GPU {}", gpu))?;
        debug!("Using GPU {}", gpu);
    }
    let cs = *reference.colorspace();

    let mut scorers = Vec::with_capacity(metrics.len());
    for &metric in &metrics {
        let scorer = Scorer::open(&vship, metric, &cs, args)
            .with_context(|| format!("Failed to initialize {}", metric))?;
        scorers.push(scorer);
    }

    let mut scores = vec![Vec::with_capacity(frames); metrics.len()];
    for index in 0..frames {
        let a = reference.frame(args.aidx + index)?;
        let b = distorted.frame(args.bidx + index)?;
        let mut line = format!("frame {:>5}:", index);
        for ((scorer, metric), series) in scorers.iter_mut().zip(&metrics).zip(&mut scores) {
            let score = scorer
                .score(&a, &b)
                .with_context(|| format!("{} failed on frame {}", metric, index))?;
            line.push_str(&format!(" {}={:.4}", metric, score));
            series.push(score);
        }
        println!("{}", line);
    }
    for scorer in scorers {
        scorer.close()?;
    }

    let report = build_report(args, frames, &metrics, scores);
    print_summary(&report);

    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
        println!("Saved to: {}", path.display());
    }

    Ok(())
}

fn build_report(args: &CompareArgs, frames: usize, metrics: &[Metric], scores: Vec<Vec<f64>>) -> CompareReport {
    let correlations = pairwise_correlations(&scores)
        .into_iter()
        .map(|(i, j, r)| Correlation {
            first: metrics[i],
            second: metrics[j],
            r,
        })
        .collect();

    let metrics = metrics
        .iter()
        .zip(scores)
        .filter_map(|(&metric, scores)| {
            let summary = Summary::compute(&scores)?;
            Some(MetricReport {
                metric,
                perception: perception(metric, summary.mean),
                summary,
                scores,
            })
        })
        .collect();

    CompareReport {
        width: args.width,
        height: args.height,
        aidx: args.aidx,
        bidx: args.bidx,
        frames,
        metrics,
        correlations,
    }
}

fn print_summary(report: &CompareReport) {
    println!("{:-<78}", "");
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10} {:>10}  {}",
        "metric", "min", "max", "mean", "median", "stddev", "level"
    );
    for entry in &report.metrics {
        let s = &entry.summary;
        println!(
            "{:<12} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}  {}",
            entry.metric.to_string(),
            s.min,
            s.max,
            s.mean,
            s.median,
            s.std_dev,
            entry.perception.map_or("-", PerceptionLevel::code)
        );
    }
    if !report.correlations.is_empty() {
        println!();
        println!("Correlation (|r|)");
        for c in &report.correlations {
            println!("  {} <-> {}: {:.6}", c.first, c.second, c.r);
        }
    }
}

fn perception(metric: Metric, mean: f64) -> Option<PerceptionLevel> {
    match metric {
        Metric::Ssimu2 => Some(PerceptionLevel::from_ssimu2(mean)),
        Metric::Butteraugli => Some(PerceptionLevel::from_butteraugli(mean)),
        Metric::Cvvdp => None,
    }
}
