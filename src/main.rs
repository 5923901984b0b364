use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use syndic::config::{Config, FeedFormat};
use syndic::feed::{AtomFeedWriter, AtomFormatter, FeedError, RssFeedWriter, RssFormatter};
use syndic::model::{AtomEntry, Link, LinkRel, Timestamp};
use syndic::util::{AsyncSink, BlockingSink, FeedSink};

mod manifest;

use manifest::Manifest;

/// Get the config directory path (~/.config/syndic/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("syndic");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(name = "syndic", about = "Render a blog post manifest as an RSS or Atom feed")]
struct Args {
    /// Post manifest (TOML)
    manifest: PathBuf,

    /// Config file (defaults to ~/.config/syndic/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format, overriding the config file
    #[arg(long, value_enum)]
    format: Option<FeedFormat>,

    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Wrap text that needs escaping in CDATA sections
    #[arg(long)]
    cdata: bool,
}

/// Counts written and skipped posts, logging the skipped ones.
#[derive(Debug, Default)]
struct Tally {
    written: usize,
    skipped: usize,
}

impl Tally {
    fn record(&mut self, post_id: &str, result: Result<(), FeedError>) -> Result<()> {
        match result {
            Ok(()) => self.written += 1,
            // Validation fails before any bytes are written, so the document stays well-formed
            Err(e) if e.is_validation() => {
                tracing::warn!(post = %post_id, error = %e, "Skipping invalid post");
                self.skipped += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to write post '{post_id}'")),
        }
        Ok(())
    }
}

async fn render_rss<S: FeedSink>(sink: S, manifest: &Manifest, config: &Config) -> Result<S> {
    let site = manifest.site()?;
    let author = manifest.author();
    let attributes = config.known_attributes();
    let formatter = RssFormatter::with_attributes(&attributes)?.use_cdata(config.use_cdata);
    let mut writer = RssFeedWriter::with_formatter(sink, &attributes, formatter)?;

    let channel = &manifest.channel;
    writer.write_title(&channel.title).await?;
    writer.write_link(&Link::new(site.as_str())).await?;
    writer.write_description(&channel.description).await?;
    if let Some(language) = &config.language {
        writer.write_language(language).await?;
    }
    if let Some(copyright) = &channel.copyright {
        writer.write_copyright(copyright).await?;
    }
    if let Some(updated) = manifest.last_updated() {
        writer.write_last_build_date(&updated).await?;
    }
    if let Some(generator) = &config.generator {
        writer.write_generator(generator).await?;
    }
    writer.write_docs().await?;
    if config.ttl_minutes > 0 {
        writer
            .write_time_to_live(Duration::from_secs(config.ttl_minutes * 60))
            .await?;
    }
    if let Some(image) = manifest.image(&site) {
        writer.write_image(&image).await?;
    }

    let mut tally = Tally::default();
    for post in manifest.published_posts() {
        let item = post.to_item(&site, &author)?;
        let result = writer.write_item(&item).await;
        tally.record(&post.id, result)?;
    }
    tracing::info!(written = tally.written, skipped = tally.skipped, "Rendered RSS feed");

    Ok(writer.finish().await?)
}

async fn render_atom<S: FeedSink>(sink: S, manifest: &Manifest, config: &Config) -> Result<S> {
    let site = manifest.site()?;
    let author = manifest.author();
    let attributes = config.known_attributes();
    let formatter = AtomFormatter::with_attributes(&attributes)?.use_cdata(config.use_cdata);
    let mut writer = AtomFeedWriter::with_formatter(sink, &attributes, formatter)?;

    let channel = &manifest.channel;
    writer
        .write_id(channel.id.as_deref().unwrap_or(site.as_str()))
        .await?;
    writer.write_title(&channel.title).await?;
    writer.write_subtitle(&channel.description).await?;
    let updated: Timestamp = manifest
        .last_updated()
        .unwrap_or_else(|| Utc::now().into());
    writer.write_updated(&updated).await?;
    writer
        .write_link(&Link::with_rel(site.as_str(), LinkRel::Alternate))
        .await?;
    writer.write_person(&author).await?;
    if let Some(copyright) = &channel.copyright {
        writer.write_rights(copyright).await?;
    }
    if let Some(generator) = &config.generator {
        writer.write_generator(generator, None, None).await?;
    }
    if let Some(icon) = manifest.image(&site) {
        writer.write_image(&icon).await?;
    }

    let mut tally = Tally::default();
    for post in manifest.published_posts() {
        let entry = AtomEntry {
            item: post.to_item(&site, &author)?,
            content_type: Some("html".to_string()),
            summary: Some(post.excerpt.clone()).filter(|s| !s.is_empty()),
            rights: None,
        };
        let result = writer.write_entry(&entry).await;
        tally.record(&post.id, result)?;
    }
    tracing::info!(written = tally.written, skipped = tally.skipped, "Rendered Atom feed");

    Ok(writer.finish().await?)
}

async fn render<S: FeedSink>(sink: S, manifest: &Manifest, config: &Config) -> Result<S> {
    tracing::debug!(format = ?config.format, async_sink = sink.is_async(), "Rendering feed");
    match config.format {
        FeedFormat::Rss => render_rss(sink, manifest, config).await,
        FeedFormat::Atom => render_atom(sink, manifest, config).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;
    if let Some(format) = args.format {
        config.format = format;
    }
    if args.cdata {
        config.use_cdata = true;
    }

    let manifest = Manifest::load(&args.manifest)?;
    manifest
        .check_author(config.format)
        .with_context(|| format!("Manifest '{}' cannot be rendered", args.manifest.display()))?;

    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file '{}'", path.display()))?;
            let sink = BlockingSink::new(std::io::BufWriter::new(file));
            render(sink, &manifest, &config).await?;
            tracing::info!(path = %path.display(), "Wrote feed");
        }
        None => {
            let sink = AsyncSink::new(tokio::io::stdout());
            render(sink, &manifest, &config).await?;
        }
    }

    Ok(())
}
