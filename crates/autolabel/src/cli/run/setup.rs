//! Run setup: config overrides, caption source and detector loading.

use std::sync::Arc;
use std::time::Duration;

use autolabel_core::{AutoLabeler, CaptionSourceFactory, Config, GroundingDino};

use super::RunArgs;

/// Everything the run loop needs.
pub(crate) struct RunContext {
    pub labeler: AutoLabeler,
    pub config: Config,
}

/// Validate input, apply CLI overrides to the config, and load both models.
pub(crate) fn setup_labeler(args: &RunArgs) -> anyhow::Result<RunContext> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input directory does not exist: {:?}\n\n  Hint: Check the path and try again.",
            args.input
        );
    }
    if !args.input.is_dir() {
        anyhow::bail!(
            "Input is not a directory: {:?}\n\n  Hint: `autolabel run` labels a folder of images.",
            args.input
        );
    }

    let mut config = Config::load()?;
    apply_overrides(&mut config, args)?;

    let captioner = CaptionSourceFactory::create(
        &config.caption,
        Duration::from_millis(config.limits.caption_timeout_ms),
    )?;
    tracing::info!("Caption source: {}", captioner.name());

    let model_dir = config.model_dir();
    if !GroundingDino::model_exists(&config.detection, &model_dir) {
        anyhow::bail!(
            "Detector model not found at {:?}\n\n  \
             Hint: Place model.onnx and tokenizer.json there (see `autolabel models path`).",
            GroundingDino::model_path(&config.detection, &model_dir)
        );
    }
    let detector = Arc::new(GroundingDino::load(&config.detection, &model_dir)?);

    let labeler = AutoLabeler::new(&config, captioner, detector)?;
    Ok(RunContext { labeler, config })
}

/// Fold CLI flags into the loaded config.
pub(crate) fn apply_overrides(config: &mut Config, args: &RunArgs) -> anyhow::Result<()> {
    if let Some(threshold) = args.box_threshold {
        check_threshold("--box-threshold", threshold)?;
        config.detection.box_threshold = threshold;
    }
    if let Some(threshold) = args.text_threshold {
        check_threshold("--text-threshold", threshold)?;
        config.detection.text_threshold = threshold;
    }
    if let Some(iou) = args.iou {
        check_threshold("--iou", iou)?;
        config.detection.iou_threshold = Some(iou);
    }
    if let Some(separator) = &args.separator {
        if separator.is_empty() {
            anyhow::bail!("--separator must not be empty");
        }
        config.tagging.separator = separator.clone();
    }
    if let Some(stop_tags) = &args.stop_tags {
        config.aggregation.stop_list = stop_tags.clone();
    }
    if args.no_stop_list {
        config.aggregation.stop_list.clear();
    }
    if let Some(device) = args.device {
        config.detection.device = device.to_string();
    }
    if let Some(model) = &args.model {
        config.detection.model = model.clone();
    }

    if let Some(captioner) = args.captioner {
        config.caption.provider = captioner.to_string();
    }
    if let Some(path) = &args.captions {
        config.caption.sidecar_path = Some(path.clone());
        if args.captioner.is_none() {
            config.caption.provider = "sidecar".to_string();
        }
    }
    if let Some(model) = &args.caption_model {
        config.caption.ollama.model = model.clone();
    }

    if let Some(dir) = &args.annotate_dir {
        config.annotation.enabled = true;
        config.annotation.output_dir = dir.clone();
    }
    if args.no_overlay {
        config.annotation.overlay = false;
    }
    Ok(())
}

fn check_threshold(flag: &str, value: f32) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&value) {
        anyhow::bail!("{flag} must be between 0.0 and 1.0, got {value}");
    }
    Ok(())
}
