use crate::feed::formatter::{DateFormat, Formatter};
use crate::feed::FeedError;
use crate::model::{filled, Attribute, Category, Content, Image, Item, Link, LinkRel, Person};
use crate::util::{FragmentWriter, ValueMode};

/// RSS 2.0 element and attribute names.
pub(crate) mod names {
    pub const RSS: &str = "rss";
    pub const CHANNEL: &str = "channel";
    pub const VERSION: &str = "version";
    pub const ITEM: &str = "item";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const LINK: &str = "link";
    pub const URL: &str = "url";
    pub const IMAGE: &str = "image";
    pub const AUTHOR: &str = "author";
    pub const CATEGORY: &str = "category";
    pub const ENCLOSURE: &str = "enclosure";
    pub const COMMENTS: &str = "comments";
    pub const SOURCE: &str = "source";
    pub const GUID: &str = "guid";
    pub const PUB_DATE: &str = "pubDate";
    pub const LAST_BUILD_DATE: &str = "lastBuildDate";
    pub const LANGUAGE: &str = "language";
    pub const COPYRIGHT: &str = "copyright";
    pub const GENERATOR: &str = "generator";
    pub const DOCS: &str = "docs";
    pub const CLOUD: &str = "cloud";
    pub const TTL: &str = "ttl";
    pub const SKIP_HOURS: &str = "skipHours";
    pub const SKIP_DAYS: &str = "skipDays";
    pub const HOUR: &str = "hour";
    pub const DAY: &str = "day";

    pub const DOMAIN: &str = "domain";
    pub const IS_PERMALINK: &str = "isPermaLink";
    pub const LENGTH: &str = "length";
    pub const TYPE: &str = "type";
}

pub const RSS_VERSION: &str = "2.0";
pub const RSS_SPECIFICATION_LINK: &str = "https://www.rssboard.org/rss-specification";

use names::*;

/// Encoder for RSS 2.0 `<item>` content and channel elements.
#[derive(Default)]
pub struct RssFormatter {
    writer: FragmentWriter,
}

impl RssFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a formatter whose namespace scope includes the `xmlns`
    /// declarations in `known_attributes` (e.g. `xmlns:atom`).
    pub fn with_attributes(known_attributes: &[Attribute]) -> Result<Self, FeedError> {
        Ok(Self {
            writer: FragmentWriter::new(known_attributes)?,
        })
    }

    /// Write text needing escapes as CDATA sections instead.
    pub fn use_cdata(mut self, use_cdata: bool) -> Self {
        self.writer.set_use_cdata(use_cdata);
        self
    }

    fn create_enclosure(&self, link: &Link) -> Result<Content, FeedError> {
        let mut content = Content::element(ENCLOSURE);
        content.add_attribute(Attribute::new(URL, link.uri.clone()));

        if link.length == 0 {
            return Err(FeedError::OutOfRange {
                field: "length",
                reason: "enclosure requires a non-zero length",
            });
        }
        content.add_attribute(Attribute::new(LENGTH, link.length.to_string()));

        let media_type = filled(&link.media_type).ok_or(FeedError::missing("media_type"))?;
        content.add_attribute(Attribute::new(TYPE, media_type.to_string()));
        Ok(content)
    }

    fn create_source(&self, link: &Link) -> Content {
        let mut content = Content::element(SOURCE);
        if link.title.as_deref() != Some(link.uri.as_str()) {
            content.add_attribute(Attribute::new(URL, link.uri.clone()));
        }
        if let Some(title) = filled(&link.title) {
            content.set_value(title);
        }
        content
    }

    fn create_plain_link(&self, link: &Link) -> Result<Content, FeedError> {
        let mut content = match &link.rel {
            None | Some(LinkRel::Alternate) => Content::element(LINK),
            Some(rel) => Content::new(rel.as_str().to_string())?,
        };

        // With a title, the title is the text and the URL moves to an attribute
        match filled(&link.title) {
            Some(title) => {
                content.set_value(title);
                content.add_attribute(Attribute::new(URL, link.uri.clone()));
            }
            None => content.set_value(link.uri.clone()),
        }

        if let Some(media_type) = filled(&link.media_type) {
            content.add_attribute(Attribute::new(TYPE, media_type.to_string()));
        }
        if link.length != 0 {
            content.add_attribute(Attribute::new(LENGTH, link.length.to_string()));
        }
        Ok(content)
    }
}

impl Formatter for RssFormatter {
    fn date_format(&self) -> DateFormat {
        DateFormat::Rfc1123
    }

    fn format(&mut self, content: &Content) -> Result<String, FeedError> {
        self.writer.render(content, None, |_, _| ValueMode::Text)
    }

    fn create_link(&self, link: &Link) -> Result<Content, FeedError> {
        if link.uri.is_empty() {
            return Err(FeedError::missing("uri"));
        }

        match &link.rel {
            Some(LinkRel::Enclosure) => self.create_enclosure(link),
            Some(LinkRel::Comments) => Ok(Content::leaf(COMMENTS, link.uri.clone())),
            Some(LinkRel::Source) => Ok(self.create_source(link)),
            _ => self.create_plain_link(link),
        }
    }

    fn create_category(&self, category: &Category) -> Result<Content, FeedError> {
        if category.name.is_empty() {
            return Err(FeedError::missing("name"));
        }

        let mut content = Content::leaf(CATEGORY, category.name.clone());
        if let Some(scheme) = &category.scheme {
            content.add_attribute(Attribute::new(DOMAIN, scheme.clone()));
        }
        Ok(content)
    }

    fn create_person(&self, person: &Person) -> Result<Content, FeedError> {
        let email = filled(&person.email).ok_or(FeedError::missing("email"))?;

        // Real name goes in parentheses: <author>email@address.com (John Doe)</author>
        let value = match filled(&person.name) {
            Some(name) => format!("{email} ({name})"),
            None => email.to_string(),
        };

        match &person.rel {
            Some(rel) => Content::with_value(rel.as_str().to_string(), value),
            None => Ok(Content::leaf(AUTHOR, value)),
        }
    }

    fn create_image(&self, image: &Image) -> Result<Content, FeedError> {
        if image.url.is_empty() {
            return Err(FeedError::missing("url"));
        }
        let title = filled(&image.title).ok_or(FeedError::missing("title"))?;
        let link = image.link.as_ref().ok_or(FeedError::missing("link"))?;

        let mut content = Content::element(IMAGE);
        content.add_field(Content::leaf(URL, image.url.clone()));
        content.add_field(Content::leaf(TITLE, title));
        content.add_field(self.create_link(link)?);

        if let Some(description) = filled(&image.description) {
            content.add_field(Content::leaf(DESCRIPTION, description));
        }
        Ok(content)
    }

    /// Builds an `<item>`.
    ///
    /// Both `title` and `description` are required here, although RSS 2.0
    /// only needs one of them.
    fn create_item(&self, item: &Item) -> Result<Content, FeedError> {
        let title = filled(&item.title).ok_or(FeedError::missing("title"))?;
        let description =
            filled(&item.description).ok_or(FeedError::missing("description"))?;

        let mut content = Content::element(ITEM);
        content.add_field(Content::leaf(TITLE, title));

        let mut has_guid_link = false;
        let mut has_content_link = false;
        for link in &item.links {
            if link.has_rel(&LinkRel::Guid) {
                has_guid_link = true;
            }
            if link.has_rel(&LinkRel::Content) {
                if has_content_link {
                    return Err(FeedError::Conflict("multiple content links"));
                }
                has_content_link = true;
            }
            content.add_field(self.create_link(link)?);
        }

        content.add_field(Content::leaf(DESCRIPTION, description));

        for person in &item.contributors {
            content.add_field(self.create_person(person)?);
        }

        for category in &item.categories {
            content.add_field(self.create_category(category)?);
        }

        if !has_guid_link {
            if let Some(id) = filled(&item.id) {
                let mut guid = Content::leaf(GUID, id);
                guid.add_attribute(Attribute::from_static(IS_PERMALINK, "false"));
                content.add_field(guid);
            }
        }

        if let Some(pub_date) = self.format_value(&item.published) {
            content.add_field(Content::leaf(PUB_DATE, pub_date));
        }

        Ok(content)
    }
}
