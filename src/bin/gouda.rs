use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use gouda::detector::DetectionStages;
use gouda::report::{BasicReporter, CsvReporter, RenameReporter, Reporter, TerseReporter};
use gouda::tools::{expand_inputs, read_image};
use gouda::{
    Detector, GoudaError, Pipeline, PipelineConfig, Rect, StructuringElement, engine_by_name,
    engine_options,
};
use image::{GrayImage, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gouda", version, about = "Finds and decodes barcodes on images")]
struct Cli {
    /// Log every pipeline stage
    #[arg(short = 'v', long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportKind {
    Basic,
    Terse,
    Csv,
    Rename,
}

#[derive(Subcommand)]
enum Command {
    /// Decode barcodes in images and directories of images
    Decode {
        #[arg(short, long, value_enum, default_value_t = ReportKind::Basic)]
        report: ReportKind,
        /// With --report rename, add -1, -2, ... instead of skipping taken names
        #[arg(long)]
        avoid_collisions: bool,
        /// Convert images to greyscale when reading
        #[arg(short, long)]
        greyscale: bool,
        /// Also detect regions with the large closing kernel
        #[arg(long)]
        large_kernel: bool,
        /// Engine name, see `gouda engines`
        engine: String,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show candidate regions for one image
    Detect {
        image: PathBuf,
        #[arg(long)]
        large_kernel: bool,
        /// Write intermediate images and a candidate overlay here
        #[arg(long)]
        stages_dir: Option<PathBuf>,
    },
    /// List engines available on this machine
    Engines,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Command::Decode {
            report,
            avoid_collisions,
            greyscale,
            large_kernel,
            engine,
            paths,
        } => decode_cmd(&engine, &paths, report, avoid_collisions, greyscale, large_kernel),
        Command::Detect {
            image,
            large_kernel,
            stages_dir,
        } => detect_cmd(&image, large_kernel, stages_dir.as_deref()),
        Command::Engines => {
            for (name, _) in engine_options() {
                println!("{name}");
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("gouda: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("gouda=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn decode_cmd(
    engine: &str,
    paths: &[PathBuf],
    report: ReportKind,
    avoid_collisions: bool,
    greyscale: bool,
    large_kernel: bool,
) -> gouda::Result<()> {
    let engine = engine_by_name(engine).inspect_err(|_| {
        let names: Vec<_> = engine_options().into_iter().map(|(n, _)| n).collect();
        eprintln!("available engines: {}", names.join(", "));
    })?;

    let mut config = PipelineConfig::from_env()?;
    config.large_kernel |= large_kernel;
    let pipeline = Pipeline::from_config(&config)?;

    let mut reporter: Box<dyn Reporter> = match report {
        ReportKind::Basic => Box::new(BasicReporter::new(io::stdout().lock())),
        ReportKind::Terse => Box::new(TerseReporter::new(io::stdout().lock())),
        ReportKind::Csv => Box::new(CsvReporter::new(io::stdout().lock(), engine.name(), greyscale)?),
        ReportKind::Rename => Box::new(RenameReporter::new(avoid_collisions)),
    };

    for path in expand_inputs(paths) {
        let outcome = read_image(&path, greyscale).and_then(|img| pipeline.decode(&img, &*engine));
        match outcome {
            Ok(outcome) => reporter.result(&path, outcome.as_ref())?,
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed");
                reporter.result(&path, None)?;
            }
        }
    }
    reporter.finish()
}

fn detect_cmd(image: &Path, large_kernel: bool, stages_dir: Option<&Path>) -> gouda::Result<()> {
    let config = PipelineConfig::from_env()?;
    let mut detector_config = config.detector;
    if large_kernel {
        detector_config = detector_config.with_structuring_element(StructuringElement::LARGE);
    }
    detector_config.capture_stages = stages_dir.is_some();

    let img = read_image(image, false)?;
    let detection = Detector::new(detector_config)?.detect(&img);
    let accepted = config.filter.filter(&detection.candidates);

    println!("Image: {} ({}x{})", image.display(), img.width(), img.height());
    println!(
        "Working image: {}x{} (scale {:.4})",
        detection.working.width(),
        detection.working.height(),
        detection.scale
    );
    println!(
        "Found {} candidates, {} within area limits",
        detection.candidates.len(),
        accepted.len()
    );
    for (i, rect) in detection.candidates.iter().enumerate() {
        let mark = if accepted.contains(rect) { '*' } else { ' ' };
        match detection.to_source(rect) {
            Ok(source) => println!("{mark} [{i}] {rect}  source {source}"),
            Err(err) => warn!(error = %err, "cannot map rect to source"),
        }
    }

    if let (Some(dir), Some(stages)) = (stages_dir, &detection.stages) {
        fs::create_dir_all(dir)?;
        write_stages(dir, stages)?;

        let mut overlay = detection.working.to_rgb8();
        for rect in &detection.candidates {
            let colour = if accepted.contains(rect) {
                Rgb([0, 255, 0])
            } else {
                Rgb([255, 0, 0])
            };
            if let Some(r) = draw_rect(rect) {
                draw_hollow_rect_mut(&mut overlay, r, colour);
            }
        }
        let path = dir.join("candidates.png");
        overlay
            .save(&path)
            .map_err(|source| GoudaError::ImageWrite { path, source })?;
    }
    Ok(())
}

fn write_stages(dir: &Path, stages: &DetectionStages) -> gouda::Result<()> {
    let images: [(&str, &GrayImage); 5] = [
        ("grey", &stages.grey),
        ("equalized", &stages.equalized),
        ("gradient", &stages.gradient),
        ("threshold", &stages.threshold),
        ("closing", &stages.closing),
    ];
    for (name, img) in images {
        let path = dir.join(format!("{name}.png"));
        img.save(&path)
            .map_err(|source| GoudaError::ImageWrite { path, source })?;
    }
    Ok(())
}

fn draw_rect(rect: &Rect) -> Option<imageproc::rect::Rect> {
    if rect.width == 0 || rect.height == 0 {
        return None;
    }
    Some(imageproc::rect::Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height))
}
