//! The `autolabel run` command.

mod setup;
pub mod types;

use types::{Captioner, Device, RecordFormat};

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use autolabel_core::{ImageLabels, RecordWriter, RunReport};

use setup::setup_labeler;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory of images whose names contain a frame number
    #[arg(required = true)]
    pub input: PathBuf,

    /// Write the tag frequency table here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write one record per labeled image to this file
    #[arg(long)]
    pub records: Option<PathBuf>,

    /// Layout of the records file
    #[arg(short, long, value_enum, default_value = "jsonl")]
    pub format: RecordFormat,

    /// Minimum query confidence for a box to survive
    #[arg(long)]
    pub box_threshold: Option<f32>,

    /// Minimum token activation for a word to join a phrase
    #[arg(long)]
    pub text_threshold: Option<f32>,

    /// Drop boxes overlapping a stronger one above this IoU
    #[arg(long)]
    pub iou: Option<f32>,

    /// Separator used to join tags into the detector prompt
    #[arg(long)]
    pub separator: Option<String>,

    /// Replace the stop-list (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub stop_tags: Option<Vec<String>>,

    /// Count every detected tag
    #[arg(long)]
    pub no_stop_list: bool,

    /// Caption source
    #[arg(long, value_enum)]
    pub captioner: Option<Captioner>,

    /// Precomputed captions (JSON object or `name<TAB>caption` lines)
    #[arg(long)]
    pub captions: Option<PathBuf>,

    /// Ollama vision model used by `--captioner ollama`
    #[arg(long)]
    pub caption_model: Option<String>,

    /// Detector model directory name under the model dir
    #[arg(long)]
    pub model: Option<String>,

    /// Detector execution device
    #[arg(long, value_enum)]
    pub device: Option<Device>,

    /// Write label.json and mask.png per image under this directory
    #[arg(long)]
    pub annotate_dir: Option<PathBuf>,

    /// Skip overlay.jpg when writing annotations
    #[arg(long)]
    pub no_overlay: bool,
}

/// Values match the clap defaults above; used by tests.
impl Default for RunArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            records: None,
            format: RecordFormat::Jsonl,
            box_threshold: None,
            text_threshold: None,
            iou: None,
            separator: None,
            stop_tags: None,
            no_stop_list: false,
            captioner: None,
            captions: None,
            caption_model: None,
            model: None,
            device: None,
            annotate_dir: None,
            no_overlay: false,
        }
    }
}

/// Execute the run command.
pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let ctx = setup_labeler(&args)?;

    let files = ctx.labeler.discover(&args.input)?;
    if files.is_empty() {
        tracing::warn!("No supported image files found in {:?}", args.input);
    } else {
        tracing::info!("Found {} image(s) to label", files.len());
    }

    let mut records = match &args.records {
        Some(path) => Some(RecordWriter::new(
            BufWriter::new(File::create(path)?),
            args.format.into(),
            false,
        )),
        None => None,
    };
    let streaming = matches!(args.format, RecordFormat::Jsonl);
    let mut collected: Vec<ImageLabels> = Vec::new();
    let mut write_error: Option<io::Error> = None;

    let progress = create_progress_bar(files.len() as u64);
    let report = ctx
        .labeler
        .run_corpus(&files, |file, outcome| {
            progress.set_message(file.file_name.clone());
            progress.inc(1);

            let (Some(writer), Ok(labels)) = (records.as_mut(), outcome) else {
                return;
            };
            if !streaming {
                collected.push(labels.clone());
            } else if write_error.is_none() {
                if let Err(e) = writer.write_record(labels) {
                    write_error = Some(e);
                }
            }
        })
        .await;
    progress.finish_and_clear();

    if let Some(e) = write_error {
        return Err(e.into());
    }
    if let Some(mut writer) = records {
        if !streaming {
            writer.write_records(&collected)?;
        }
        writer.flush()?;
        if let Some(path) = &args.records {
            tracing::info!("{} records written to {:?}", writer.records_written(), path);
        }
    }

    let pretty = ctx.config.output.pretty;
    match &args.output {
        Some(path) => {
            let mut writer = RecordWriter::new(
                BufWriter::new(File::create(path)?),
                autolabel_core::OutputFormat::Json,
                pretty,
            );
            writer.write_table(&report.tag_frequencies)?;
            writer.flush()?;
            tracing::info!("Tag frequencies written to {:?}", path);
        }
        None => {
            let mut writer =
                RecordWriter::new(io::stdout().lock(), autolabel_core::OutputFormat::Json, pretty);
            writer.write_table(&report.tag_frequencies)?;
        }
    }

    print_summary(&report);
    Ok(())
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

/// Print run statistics and the most frequent tags to stderr.
fn print_summary(report: &RunReport) {
    let stats = &report.stats;
    let elapsed = Duration::from_secs_f64(stats.total_seconds);
    let top: Vec<String> = report
        .tag_frequencies
        .ranked()
        .into_iter()
        .take(5)
        .map(|(tag, count)| format!("{tag} ({count})"))
        .collect();

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Labeled:      {:>8}", stats.succeeded);
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    eprintln!("    Detections:   {:>8}", stats.detections);
    eprintln!("    Tags:         {:>8}", report.tag_frequencies.len());
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", stats.images_per_second);
    if !top.is_empty() {
        eprintln!("    Top:          {}", top.join(", "));
    }
    eprintln!("  ====================================");
    for failure in &report.failures {
        eprintln!("    ! {}: {}", failure.file_name, failure.error);
    }
}
