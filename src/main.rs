//! `dermannot-replay`: run a scripted editing session over a prediction file
//! and write the resulting submission.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use dermannot::compare::assess_for_review;
use dermannot::config::EditorConfig;
use dermannot::format::{AnnotatedImage, FormatRegistry, ImportOptions, Prediction, RegionFormat};
use dermannot::geometry::{Size, Viewport};
use dermannot::model::{CaseContext, CaseStatus, Workflow};
use dermannot::replay::{self, ReplayError, ReplayScript};
use dermannot::state::EditorSession;
use dermannot::transport::JsonFileSink;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WorkflowArg {
    Upload,
    Review,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Pending,
    InProgress,
    Completed,
    Reviewed,
}

impl From<StatusArg> for CaseStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Pending => CaseStatus::Pending,
            StatusArg::InProgress => CaseStatus::InProgress,
            StatusArg::Completed => CaseStatus::Completed,
            StatusArg::Reviewed => CaseStatus::Reviewed,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "dermannot-replay", about = "Replay editor events over model predictions")]
struct Args {
    /// Prediction list or stored case (JSON)
    #[arg(short, long)]
    predictions: PathBuf,

    /// Event script (JSON); without it the predictions are submitted as-is
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Where to write the submission payload
    #[arg(short, long)]
    output: PathBuf,

    /// Source image; its pixel size becomes the natural size
    #[arg(long)]
    image: Option<PathBuf>,

    /// Natural width, when no image is given
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Natural height, when no image is given
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Rendered width and height on screen (defaults to the natural size)
    #[arg(long, num_args = 2, value_names = ["W", "H"])]
    display: Option<Vec<f64>>,

    #[arg(long, value_enum, default_value = "upload")]
    workflow: WorkflowArg,

    /// Case status; defaults to the stored case status, else completed
    /// (upload) or pending (review)
    #[arg(long, value_enum)]
    status: Option<StatusArg>,

    /// Feedback or review notes, overriding the script's and the stored case's
    #[arg(long)]
    notes: Option<String>,

    /// Also export the edited regions in YOLO format to this file
    #[arg(long)]
    yolo: Option<PathBuf>,

    /// Also export the edited regions as Pascal VOC XML to this file
    #[arg(long)]
    voc: Option<PathBuf>,

    /// Write a second-review assessment (model vs edited) to this file
    #[arg(long)]
    assessment: Option<PathBuf>,

    /// Configuration file (defaults to the per-user config, if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match EditorConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {:?}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => EditorConfig::load_from_default_path().unwrap_or_default(),
    };

    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Replay error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &EditorConfig) -> Result<(), ReplayError> {
    let registry = FormatRegistry::new();
    let source = registry
        .require("json")?
        .import(&args.predictions, &ImportOptions::new())?;
    if let Some(stored) = source.status {
        log::info!("Reopening stored case with status '{}'", stored.name());
    }
    let original: Vec<Prediction> = source.regions.iter().map(Prediction::from).collect();

    let natural = natural_size(args)?;
    let rendered = match args.display.as_deref() {
        Some([w, h]) => Some(Size::new(*w, *h)),
        _ => natural,
    };

    let workflow = match args.workflow {
        WorkflowArg::Upload => Workflow::Upload,
        WorkflowArg::Review => Workflow::Review,
    };
    let requested = args.status.map(CaseStatus::from);
    let status = replay::opening_status(workflow, requested, source.status);

    let mut session = EditorSession::new(CaseContext::new(workflow, status), config.editor.clone());
    session.load_predictions(&original);
    if let Some(rendered) = rendered {
        session.set_viewport(Viewport {
            container: rendered,
            rendered,
            natural,
        });
    }

    let script = match &args.script {
        Some(path) => ReplayScript::load(path)?,
        None => ReplayScript::default(),
    };
    let report = replay::run(&mut session, &script);
    println!(
        "Applied {} events ({} ignored), {} regions",
        report.applied,
        report.ignored,
        session.regions().len()
    );

    let notes = args
        .notes
        .clone()
        .or(script.notes.clone())
        .or(source.notes.clone());
    let mut sink = JsonFileSink::new(&args.output);
    session.submit(&mut sink, notes)?;

    let edited = AnnotatedImage::new(
        image_name(args),
        natural,
        session.regions().as_slice().to_vec(),
    );
    for (id, path) in [("yolo", &args.yolo), ("voc", &args.voc)] {
        if let Some(path) = path {
            export(registry.require(id)?, &edited, path)?;
        }
    }

    if let Some(path) = &args.assessment {
        let feedback: Vec<Prediction> = session.regions().iter().map(Prediction::from).collect();
        let assessment = assess_for_review(
            &original,
            &feedback,
            config.review.ciou_threshold,
            config.review.confidence_threshold,
        );
        std::fs::write(path, serde_json::to_string_pretty(&assessment)?)?;
        println!(
            "Assessment written to {:?} (needs review: {})",
            path, assessment.needs_review
        );
    }

    Ok(())
}

fn natural_size(args: &Args) -> Result<Option<Size>, ReplayError> {
    if let Some(path) = &args.image {
        let (width, height) = image::image_dimensions(path)?;
        log::info!("Natural size {}x{} from {:?}", width, height, path);
        return Ok(Some(Size::new(f64::from(width), f64::from(height))));
    }
    Ok(match (args.width, args.height) {
        (Some(width), Some(height)) => Some(Size::new(f64::from(width), f64::from(height))),
        _ => {
            log::warn!("Natural image size unknown; manipulation and drawing are disabled");
            None
        }
    })
}

fn image_name(args: &Args) -> String {
    args.image
        .as_deref()
        .unwrap_or(&args.predictions)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

fn export(
    format: &dyn RegionFormat,
    image: &AnnotatedImage,
    path: &Path,
) -> Result<(), ReplayError> {
    let result = format.export(image, path)?;
    for warning in &result.warnings {
        log::warn!("{}: {}", format.display_name(), warning.message);
    }
    println!(
        "Exported {} regions as {} to {:?}",
        result.regions_exported,
        format.display_name(),
        path
    );
    Ok(())
}
