//! The `autolabel tags` command: show what a caption turns into.

use clap::Args;
use serde::Serialize;

use autolabel_core::{Config, TagExtractor};

/// Arguments for the `tags` command.
#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Caption text (multiple words are joined with spaces)
    #[arg(required = true, num_args = 1..)]
    pub caption: Vec<String>,

    /// Separator used to join tags
    #[arg(long)]
    pub separator: Option<String>,

    /// Print a JSON object instead of plain lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct TagsOutput<'a> {
    caption: &'a str,
    tags: String,
    prompt: String,
}

/// Execute the tags command.
pub fn execute(args: TagsArgs) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(separator) = &args.separator {
        if separator.is_empty() {
            anyhow::bail!("--separator must not be empty");
        }
        config.tagging.separator = separator.clone();
    }

    let lexicon_dir = config.lexicon_dir();
    let extractor = TagExtractor::from_config(&config.tagging, lexicon_dir.as_deref())?;
    let caption = args.caption.join(" ");
    let output = describe(&extractor, &caption);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("tags:   {}", output.tags);
        println!("prompt: {}", output.prompt);
    }
    Ok(())
}

fn describe<'a>(extractor: &TagExtractor, caption: &'a str) -> TagsOutput<'a> {
    let (tags, prompt) = extractor.prompt(caption);
    TagsOutput {
        caption,
        tags,
        prompt: prompt.into_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_caption() {
        let extractor = TagExtractor::new(", ");
        let output = describe(&extractor, "a cat sits on a table");
        assert_eq!(output.tags, "cat, table");
        assert_eq!(output.prompt, "cat, table.");
    }

    #[test]
    fn describe_noun_less_caption() {
        let extractor = TagExtractor::new(", ");
        let output = describe(&extractor, "");
        assert_eq!(output.tags, "");
        assert_eq!(output.prompt, ".");
    }
}
