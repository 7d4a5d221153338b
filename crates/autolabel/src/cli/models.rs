//! The `autolabel models` command: where detector models live and which are
//! installed.
//!
//! A detector directory holds `model.onnx` (Grounding DINO exported with
//! `img`, `input_ids`, `attention_mask`, `position_ids`, `token_type_ids` and
//! `text_token_mask` inputs) and its BERT `tokenizer.json`.

use std::path::Path;

use clap::{Args, Subcommand};

use autolabel_core::config::DetectionConfig;
use autolabel_core::tagging::lexicon::LEXICON_FILENAME;
use autolabel_core::{Config, GroundingDino};

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// List detector models found in the model directory
    List,

    /// Show where the configured detector is expected
    Path,
}

/// One detector directory on disk.
#[derive(Debug, PartialEq, Eq)]
pub struct InstalledModel {
    pub name: String,
    pub has_model: bool,
    pub has_tokenizer: bool,
}

impl InstalledModel {
    pub fn is_complete(&self) -> bool {
        self.has_model && self.has_tokenizer
    }
}

/// Scan `model_dir` for detector directories, sorted by name.
pub fn scan_models(model_dir: &Path) -> anyhow::Result<Vec<InstalledModel>> {
    if !model_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut models = Vec::new();
    for entry in std::fs::read_dir(model_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let lookup = DetectionConfig {
            model: name.clone(),
            ..DetectionConfig::default()
        };
        models.push(InstalledModel {
            has_model: GroundingDino::model_path(&lookup, model_dir).exists(),
            has_tokenizer: GroundingDino::tokenizer_path(&lookup, model_dir).exists(),
            name,
        });
    }
    models.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(models)
}

/// Execute the models command.
pub fn execute(args: ModelsArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let model_dir = config.model_dir();

    match args.command {
        ModelsCommand::Path => {
            println!("{}", model_dir.join(&config.detection.model).display());
        }
        ModelsCommand::List => {
            let models = scan_models(&model_dir)?;
            if models.is_empty() {
                println!("No detector models in {}", model_dir.display());
            }
            for model in &models {
                let marker = if model.name == config.detection.model {
                    "*"
                } else {
                    " "
                };
                let status = match (model.has_model, model.has_tokenizer) {
                    (true, true) => "ready",
                    (true, false) => "missing tokenizer.json",
                    (false, true) => "missing model.onnx",
                    (false, false) => "empty",
                };
                println!("{marker} {:<32} {status}", model.name);
            }

            if let Some(dir) = config.lexicon_dir() {
                let lexicon = dir.join(LEXICON_FILENAME);
                let state = if lexicon.exists() { "found" } else { "missing" };
                println!("  noun lexicon: {} ({state})", lexicon.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_reports_completeness() {
        let dir = tempfile::tempdir().unwrap();
        let ready = dir.path().join("groundingdino-swint-ogc");
        let partial = dir.path().join("alpha");
        std::fs::create_dir_all(&ready).unwrap();
        std::fs::create_dir_all(&partial).unwrap();
        std::fs::write(ready.join("model.onnx"), b"").unwrap();
        std::fs::write(ready.join("tokenizer.json"), b"{}").unwrap();
        std::fs::write(partial.join("model.onnx"), b"").unwrap();
        std::fs::write(dir.path().join("stray.txt"), b"").unwrap();

        let models = scan_models(dir.path()).unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "alpha");
        assert!(!models[0].is_complete());
        assert!(models[1].is_complete());
    }

    #[test]
    fn scan_missing_dir_is_empty() {
        let models = scan_models(Path::new("/no/such/model/dir")).unwrap();
        assert!(models.is_empty());
    }
}
