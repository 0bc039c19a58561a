//! One-shot article generation.
//!
//! Usage: `generate-article <topic words...> [--min-words N]`
//!
//! Prints the article as pretty JSON on stdout. Logs go to stderr.

use std::sync::Arc;

use article_crew::{config::Config, llm::ProviderRegistry, ArticlePipeline};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "generate-article")]
#[command(about = "Research, write and edit an article about a topic")]
struct Args {
    /// Topic words, joined with single spaces
    #[arg(required = true)]
    topic: Vec<String>,

    /// Minimum word count hint (defaults to MIN_WORDS or 300)
    #[arg(long)]
    min_words: Option<u32>,
}

impl Args {
    fn topic(&self) -> String {
        self.topic.join(" ")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "article_crew=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let min_words = args.min_words.unwrap_or(config.min_words);

    let registry = Arc::new(ProviderRegistry::with_defaults(&config));
    let pipeline = ArticlePipeline::new(config, registry);

    let article = pipeline.generate(&args.topic(), min_words).await?;
    println!("{}", serde_json::to_string_pretty(&article)?);
    Ok(())
}
