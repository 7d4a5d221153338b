//! Pipeline orchestration: wires the per-image stages together and runs a
//! corpus sequentially.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::aggregate::{FrequencyAggregator, StopList, TagFrequencyTable};
use crate::annotation::AnnotationWriter;
use crate::caption::{CaptionSource, RetryPolicy};
use crate::config::Config;
use crate::detection::{
    non_maximum_suppression, DetectionDecoder, DetectionSource, RawDetections,
};
use crate::error::PipelineError;
use crate::tagging::{Prompt, TagExtractor};
use crate::types::{ImageFailure, ImageLabels, ProcessingStats, RunReport};

use super::decode::{ImageDecoder, LoadedImage};
use super::discovery::{CorpusDiscovery, DiscoveredFile};

type DetectTask = JoinHandle<Result<RawDetections, PipelineError>>;

/// Labels a corpus of images with caption-driven open-vocabulary detection.
///
/// The caption and detection sources are acquired once and live as long as
/// the labeler.
pub struct AutoLabeler {
    discovery: CorpusDiscovery,
    decoder: ImageDecoder,
    captioner: Box<dyn CaptionSource>,
    extractor: TagExtractor,
    detector: Arc<dyn DetectionSource>,
    decoding: DetectionDecoder,
    aggregator: FrequencyAggregator,
    annotations: Option<AnnotationWriter>,
    iou_threshold: Option<f32>,
    retry: RetryPolicy,
    caption_timeout_ms: u64,
    detect_timeout_ms: u64,
    /// Inference still running after its timeout fired
    stalled_detect: Mutex<Option<DetectTask>>,
}

impl AutoLabeler {
    /// Assemble a labeler from config and the two model-backed sources.
    pub fn new(
        config: &Config,
        captioner: Box<dyn CaptionSource>,
        detector: Arc<dyn DetectionSource>,
    ) -> Result<Self, PipelineError> {
        let lexicon_dir = config.lexicon_dir();
        let extractor = TagExtractor::from_config(&config.tagging, lexicon_dir.as_deref())?;
        let stop_list: StopList = config.aggregation.stop_list.iter().cloned().collect();
        let annotations = config
            .annotation
            .enabled
            .then(|| AnnotationWriter::from_config(&config.annotation));

        tracing::debug!(
            "AutoLabeler: caption={}, detector={}, box>{}, text>{}, {} stop tags",
            captioner.name(),
            detector.name(),
            config.detection.box_threshold,
            config.detection.text_threshold,
            stop_list.len()
        );

        Ok(Self {
            discovery: CorpusDiscovery::new(config.processing.clone()),
            decoder: ImageDecoder::new(config.limits.clone()),
            captioner,
            extractor,
            detector,
            decoding: DetectionDecoder::new(
                config.detection.box_threshold,
                config.detection.text_threshold,
            ),
            aggregator: FrequencyAggregator::new(stop_list),
            annotations,
            iou_threshold: config.detection.iou_threshold,
            retry: RetryPolicy::from_config(&config.pipeline),
            caption_timeout_ms: config.limits.caption_timeout_ms,
            detect_timeout_ms: config.limits.detect_timeout_ms,
            stalled_detect: Mutex::new(None),
        })
    }

    /// Discover the corpus in `dir`, in processing order.
    pub fn discover(&self, dir: &Path) -> Result<Vec<DiscoveredFile>, PipelineError> {
        self.discovery.discover(dir)
    }

    pub fn tag_extractor(&self) -> &TagExtractor {
        &self.extractor
    }

    pub fn aggregator(&self) -> &FrequencyAggregator {
        &self.aggregator
    }

    /// Caption, tag, detect and decode one image.
    pub async fn label_image(&self, file: &DiscoveredFile) -> Result<ImageLabels, PipelineError> {
        let start = Instant::now();
        let loaded = self.decoder.load(file).await?;
        tracing::trace!("  Decode: {:?}", start.elapsed());

        let caption = self.caption_with_retry(&loaded).await?;
        let (tags, prompt) = self.extractor.prompt(&caption);
        tracing::debug!(
            "{}: caption={:?} prompt={:?}",
            file.file_name,
            caption,
            prompt.as_str()
        );

        let detect_start = Instant::now();
        let raw = self.detect(&loaded, &prompt).await?;
        tracing::trace!("  Detect: {:?}", detect_start.elapsed());

        let mut detections = self.decoding.decode(&raw).into_vec();
        if let Some(iou) = self.iou_threshold {
            detections = non_maximum_suppression(detections, iou);
        }

        if let Some(writer) = &self.annotations {
            writer.write(&loaded, &caption, &detections)?;
        }

        Ok(ImageLabels {
            file_name: file.file_name.clone(),
            ordering_key: file.ordering_key,
            width: loaded.width,
            height: loaded.height,
            caption,
            tags,
            prompt: prompt.into_string(),
            detections,
        })
    }

    /// Label every file in order and aggregate the tag frequencies.
    ///
    /// A failing image is logged, recorded in the report and skipped.
    /// `on_image` sees every outcome as it happens.
    pub async fn run_corpus<F>(&self, files: &[DiscoveredFile], mut on_image: F) -> RunReport
    where
        F: FnMut(&DiscoveredFile, &Result<ImageLabels, PipelineError>),
    {
        let start = Instant::now();
        let mut table = TagFrequencyTable::new();
        let mut stats = ProcessingStats::default();
        let mut failures = Vec::new();

        for file in files {
            let outcome = self.label_image(file).await;
            match &outcome {
                Ok(labels) => {
                    table = self.aggregator.accumulate(table, labels.tokens());
                    stats.succeeded += 1;
                    stats.detections += labels.detections.len();
                    let found: Vec<&str> =
                        labels.detections.iter().map(|d| d.label.as_str()).collect();
                    tracing::info!("{} found objs: {:?}", file.file_name, found);
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!("Failed to label {}: {}", file.file_name, e);
                    failures.push(ImageFailure {
                        file_name: file.file_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
            on_image(file, &outcome);
        }

        stats.total_seconds = start.elapsed().as_secs_f64();
        stats.images_per_second = if stats.total_seconds > 0.0 {
            (stats.succeeded + stats.failed) as f64 / stats.total_seconds
        } else {
            0.0
        };

        tracing::info!(
            "Labeled {} images ({} failed), {} distinct tags",
            stats.succeeded,
            stats.failed,
            table.len()
        );

        RunReport {
            tag_frequencies: table,
            stats,
            failures,
        }
    }

    /// Discover and label a whole directory.
    pub async fn run(&self, dir: &Path) -> Result<RunReport, PipelineError> {
        let files = self.discover(dir)?;
        Ok(self.run_corpus(&files, |_, _| {}).await)
    }

    /// Caption with a timeout, retrying transient failures with backoff.
    async fn caption_with_retry(&self, image: &LoadedImage) -> Result<String, PipelineError> {
        let limit = Duration::from_millis(self.caption_timeout_ms);
        let mut retries = 0;
        loop {
            let result = match timeout(limit, self.captioner.caption(image)).await {
                Ok(result) => result,
                Err(_) => Err(PipelineError::Timeout {
                    path: image.path.clone(),
                    stage: "caption".to_string(),
                    timeout_ms: self.caption_timeout_ms,
                }),
            };

            match result {
                Err(e) if self.retry.should_retry(&e, retries) => {
                    let delay = self.retry.delay(retries);
                    tracing::warn!(
                        "Caption attempt {} for {} failed ({}), retrying in {:?}",
                        retries + 1,
                        image.file_name,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    retries += 1;
                }
                other => return other,
            }
        }
    }

    /// Run the detector on the blocking pool with a timeout.
    ///
    /// A timed-out inference cannot be cancelled; it is parked and awaited
    /// before the next one starts, so its time is not charged to the next
    /// image's timeout.
    async fn detect(
        &self,
        image: &LoadedImage,
        prompt: &Prompt,
    ) -> Result<RawDetections, PipelineError> {
        let detector = Arc::clone(&self.detector);
        let pixels = Arc::clone(&image.image);
        let prompt = prompt.clone();
        let path = image.path.clone();

        self.drain_stalled_detect().await;
        let mut task =
            tokio::task::spawn_blocking(move || detector.detect(&pixels, &prompt, &path));
        let result = timeout(Duration::from_millis(self.detect_timeout_ms), &mut task).await;

        match result {
            Ok(Ok(detected)) => detected,
            Ok(Err(e)) => Err(PipelineError::Detection {
                path: image.path.clone(),
                message: format!("Task join error: {}", e),
            }),
            Err(_) => {
                self.park_stalled_detect(task);
                Err(PipelineError::Timeout {
                    path: image.path.clone(),
                    stage: "detect".to_string(),
                    timeout_ms: self.detect_timeout_ms,
                })
            }
        }
    }

    fn park_stalled_detect(&self, task: DetectTask) {
        match self.stalled_detect.lock() {
            Ok(mut slot) => *slot = Some(task),
            Err(poisoned) => *poisoned.into_inner() = Some(task),
        }
    }

    async fn drain_stalled_detect(&self) {
        let stalled = match self.stalled_detect.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = stalled {
            let start = Instant::now();
            let _ = task.await;
            tracing::debug!("Waited {:?} for a timed-out detection to finish", start.elapsed());
        }
    }
}
