//! Blog post manifest read by the command-line tool.
//!
//! ```toml
//! [channel]
//! title = "Example Blog"
//! description = "Notes"
//! link = "https://example.com/"
//! author = "Jane"
//! email = "jane@example.com"
//!
//! [[posts]]
//! id = "hello"
//! title = "Hello"
//! content = "<p>First post</p>"
//! slug = "blog/hello"
//! published = "2024-01-15T10:30:00Z"
//! categories = ["intro"]
//! ```
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use url::Url;

use syndic::config::FeedFormat;
use syndic::model::{Category, Image, Item, Link, LinkRel, Person, Timestamp};

#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub channel: Channel,
    #[serde(default)]
    pub posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub struct Channel {
    pub title: String,
    pub description: String,
    /// Site root; post slugs are resolved against it.
    pub link: String,
    /// Atom feed id. Defaults to `link`.
    pub id: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
    pub copyright: Option<String>,
    /// Channel image URL (RSS) or icon (Atom).
    pub image: Option<String>,
    pub updated: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    pub slug: String,
    pub published: Timestamp,
    pub last_modified: Option<Timestamp>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "default_true")]
    pub is_published: bool,
}

fn default_true() -> bool {
    true
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest '{}'", path.display()))?;
        let manifest: Manifest = toml::from_str(&content)
            .with_context(|| format!("Invalid manifest '{}'", path.display()))?;
        Ok(manifest)
    }

    pub fn site(&self) -> Result<Url> {
        Url::parse(&self.channel.link)
            .with_context(|| format!("Channel link '{}' is not an absolute URL", self.channel.link))
    }

    /// Published posts, newest first.
    pub fn published_posts(&self) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.iter().filter(|p| p.is_published).collect();
        posts.sort_by(|a, b| b.published.cmp(&a.published));
        posts
    }

    /// Latest modification across published posts, falling back to the
    /// channel's `updated` value.
    pub fn last_updated(&self) -> Option<Timestamp> {
        self.published_posts()
            .iter()
            .map(|p| p.last_modified.unwrap_or(p.published))
            .max()
            .or(self.channel.updated)
    }

    pub fn author(&self) -> Person {
        Person {
            name: self.channel.author.clone(),
            email: self.channel.email.clone(),
            ..Person::default()
        }
    }

    /// Every post carries the channel author, so a field the format needs
    /// must be set here: RSS writes `<author>` from the email, Atom
    /// requires a name.
    pub fn check_author(&self, format: FeedFormat) -> Result<()> {
        let (field, value) = match format {
            FeedFormat::Rss => ("email", &self.channel.email),
            FeedFormat::Atom => ("author", &self.channel.author),
        };
        if value.as_deref().map_or(true, str::is_empty) {
            bail!("[channel] {field} is required for {format:?} output");
        }
        Ok(())
    }

    pub fn image(&self, site: &Url) -> Option<Image> {
        let url = self.channel.image.clone()?;
        Some(Image {
            url,
            title: Some(self.channel.title.clone()),
            link: Some(Link::new(site.as_str())),
            ..Image::default()
        })
    }
}

impl Post {
    /// Converts the post to a feed item. `description` is the full content,
    /// or the excerpt when no content is given.
    pub fn to_item(&self, site: &Url, author: &Person) -> Result<Item> {
        let link = site
            .join(&self.slug)
            .with_context(|| format!("Post '{}' has an invalid slug", self.id))?;

        let description = if self.content.is_empty() {
            &self.excerpt
        } else {
            &self.content
        };

        let mut item = Item {
            id: Some(self.id.clone()),
            title: Some(self.title.clone()),
            description: Some(description.clone()),
            published: Some(self.published),
            last_updated: Some(self.last_modified.unwrap_or(self.published)),
            ..Item::default()
        };
        item.add_link(Link::with_rel(link.as_str(), LinkRel::Alternate));
        item.add_contributor(author.clone());
        for category in &self.categories {
            item.add_category(Category::new(category.as_str()));
        }
        Ok(item)
    }
}
