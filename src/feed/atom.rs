use crate::feed::formatter::{DateFormat, Formatter};
use crate::feed::FeedError;
use crate::model::{
    filled, AtomEntry, Attribute, Category, Content, Image, Item, Link, LinkRel, Person,
    PersonRel, PLAIN_TEXT_CONTENT_TYPE,
};
use crate::util::{is_xhtml_media_type, is_xml_media_type, FragmentWriter, ValueMode};

pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// Atom 1.0 element and attribute names.
pub(crate) mod names {
    pub const FEED: &str = "feed";
    pub const ENTRY: &str = "entry";
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const SUBTITLE: &str = "subtitle";
    pub const UPDATED: &str = "updated";
    pub const PUBLISHED: &str = "published";
    pub const LINK: &str = "link";
    pub const CONTENT: &str = "content";
    pub const SOURCE: &str = "source";
    pub const SUMMARY: &str = "summary";
    pub const RIGHTS: &str = "rights";
    pub const CATEGORY: &str = "category";
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const URI: &str = "uri";
    pub const ICON: &str = "icon";
    pub const GENERATOR: &str = "generator";

    pub const HREF: &str = "href";
    pub const REL: &str = "rel";
    pub const TYPE: &str = "type";
    pub const LENGTH: &str = "length";
    pub const SRC: &str = "src";
    pub const TERM: &str = "term";
    pub const SCHEME: &str = "scheme";
    pub const LABEL: &str = "label";
    pub const VERSION: &str = "version";
}

use names::*;

/// Atom text constructs whose values may be XHTML.
const TEXT_CONSTRUCTS: [&str; 5] = [TITLE, SUBTITLE, SUMMARY, CONTENT, RIGHTS];

/// Encoder for Atom 1.0 `<entry>` content and feed elements.
///
/// Fragments are rendered as if inside an element whose default namespace is
/// Atom, so they carry no `xmlns` of their own.
pub struct AtomFormatter {
    writer: FragmentWriter,
}

impl AtomFormatter {
    pub fn new() -> Self {
        // The Atom declaration alone always primes successfully
        Self::with_attributes(&[]).unwrap_or_else(|_| Self {
            writer: FragmentWriter::default(),
        })
    }

    /// Creates a formatter primed with `known_attributes`; the Atom default
    /// namespace is added first when no `xmlns*` attribute declares it.
    pub fn with_attributes(known_attributes: &[Attribute]) -> Result<Self, FeedError> {
        let attributes = ensure_atom_namespace(known_attributes);
        Ok(Self {
            writer: FragmentWriter::new(&attributes)?,
        })
    }

    /// Write text needing escapes as CDATA sections instead.
    pub fn use_cdata(mut self, use_cdata: bool) -> Self {
        self.writer.set_use_cdata(use_cdata);
        self
    }

    pub fn format_entry(&mut self, entry: &AtomEntry) -> Result<String, FeedError> {
        let content = self.create_entry(entry)?;
        self.format(&content)
    }

    /// Builds an `<entry>`, including the Atom-only content type, summary and
    /// rights.
    pub fn create_entry(&self, entry: &AtomEntry) -> Result<Content, FeedError> {
        self.entry_content(&entry.item, Some(entry))
    }

    fn entry_content(
        &self,
        item: &Item,
        extras: Option<&AtomEntry>,
    ) -> Result<Content, FeedError> {
        let id = filled(&item.id).ok_or(FeedError::missing("id"))?;
        let updated = self
            .format_value(&item.last_updated)
            .ok_or(FeedError::missing("last_updated"))?;

        let mut result = Content::element(ENTRY);
        result.add_field(Content::leaf(ID, id));
        result.add_field(match &item.title {
            Some(title) => Content::leaf(TITLE, title.clone()),
            None => Content::element(TITLE),
        });
        result.add_field(Content::leaf(UPDATED, updated));
        if let Some(published) = self.format_value(&item.published) {
            result.add_field(Content::leaf(PUBLISHED, published));
        }

        let mut has_content_link = false;
        let mut has_alternate_link = false;
        for link in &item.links {
            if link.has_rel(&LinkRel::Content) {
                if has_content_link {
                    return Err(FeedError::Conflict("multiple content links"));
                }
                has_content_link = true;
            } else if link.is_alternate() {
                has_alternate_link = true;
            }
            result.add_field(self.create_link(link)?);
        }

        let mut has_author = false;
        for person in &item.contributors {
            has_author |= person.is_author();
            result.add_field(self.create_person(person)?);
        }
        if !has_author {
            return Err(FeedError::missing("author"));
        }

        for category in &item.categories {
            result.add_field(self.create_category(category)?);
        }

        match filled(&item.description) {
            Some(_) if has_content_link => {
                return Err(FeedError::Conflict(
                    "description and content link are mutually exclusive",
                ));
            }
            Some(description) => {
                let mut content = Content::leaf(CONTENT, description);
                if let Some(content_type) = extras
                    .and_then(|e| filled(&e.content_type))
                    .filter(|t| !t.eq_ignore_ascii_case(PLAIN_TEXT_CONTENT_TYPE))
                {
                    content.add_attribute(Attribute::new(TYPE, content_type.to_string()));
                }
                result.add_field(content);
            }
            None if !(has_content_link || has_alternate_link) => {
                return Err(FeedError::missing("description or alternate link"));
            }
            None => {}
        }

        if let Some(entry) = extras {
            if let Some(summary) = filled(&entry.summary) {
                result.add_field(Content::leaf(SUMMARY, summary));
            }
            if let Some(rights) = filled(&entry.rights) {
                result.add_field(Content::leaf(RIGHTS, rights));
            }
        }

        Ok(result)
    }

    fn create_plain_link(&self, link: &Link) -> Content {
        let mut result = Content::element(LINK);
        if let Some(title) = filled(&link.title) {
            result.add_attribute(Attribute::new(TITLE, title.to_string()));
        }
        result.add_attribute(Attribute::new(HREF, link.uri.clone()));
        if let Some(rel) = &link.rel {
            result.add_attribute(Attribute::new(REL, rel.as_str().to_string()));
        }
        if let Some(media_type) = filled(&link.media_type) {
            result.add_attribute(Attribute::new(TYPE, media_type.to_string()));
        }
        if link.length > 0 {
            result.add_attribute(Attribute::new(LENGTH, link.length.to_string()));
        }
        result
    }

    fn create_content_link(&self, link: &Link) -> Content {
        let mut result = Content::element(CONTENT);
        result.add_attribute(Attribute::new(SRC, link.uri.clone()));
        if let Some(media_type) = filled(&link.media_type) {
            result.add_attribute(Attribute::new(TYPE, media_type.to_string()));
        }
        result
    }

    fn create_source_link(&self, link: &Link) -> Content {
        let mut result = Content::element(SOURCE);
        if let Some(title) = filled(&link.title) {
            result.add_field(Content::leaf(TITLE, title));
        }

        let inner = Link {
            uri: link.uri.clone(),
            media_type: link.media_type.clone(),
            length: link.length,
            ..Link::default()
        };
        result.add_field(self.create_plain_link(&inner));

        if let Some(updated) = self.format_value(&link.last_updated) {
            result.add_field(Content::leaf(UPDATED, updated));
        }
        result
    }
}

impl Default for AtomFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for AtomFormatter {
    fn date_format(&self) -> DateFormat {
        DateFormat::Rfc3339
    }

    fn format(&mut self, content: &Content) -> Result<String, FeedError> {
        self.writer
            .render(content, Some(ATOM_NAMESPACE), atom_value_mode)
    }

    fn create_link(&self, link: &Link) -> Result<Content, FeedError> {
        if link.uri.is_empty() {
            return Err(FeedError::missing("uri"));
        }

        Ok(match &link.rel {
            Some(LinkRel::Content) => self.create_content_link(link),
            Some(LinkRel::Source) => self.create_source_link(link),
            _ => self.create_plain_link(link),
        })
    }

    fn create_category(&self, category: &Category) -> Result<Content, FeedError> {
        if category.name.is_empty() {
            return Err(FeedError::missing("name"));
        }

        let mut result = Content::element(CATEGORY);
        result.add_attribute(Attribute::new(TERM, category.name.clone()));
        if let Some(scheme) = filled(&category.scheme) {
            result.add_attribute(Attribute::new(SCHEME, scheme.to_string()));
        }
        if let Some(label) = filled(&category.label) {
            result.add_attribute(Attribute::new(LABEL, label.to_string()));
        }
        Ok(result)
    }

    fn create_person(&self, person: &Person) -> Result<Content, FeedError> {
        let name = person.name.as_deref().ok_or(FeedError::missing("name"))?;

        let mut result = match &person.rel {
            None | Some(PersonRel::Author) => Content::element("author"),
            Some(PersonRel::Contributor) => Content::element("contributor"),
            Some(PersonRel::Custom(_)) => {
                return Err(FeedError::OutOfRange {
                    field: "rel",
                    reason: "Atom people must be an author or contributor",
                });
            }
        };

        result.add_field(Content::leaf(NAME, name));
        if let Some(email) = filled(&person.email) {
            result.add_field(Content::leaf(EMAIL, email));
        }
        if let Some(uri) = &person.uri {
            result.add_field(Content::leaf(URI, uri.clone()));
        }
        Ok(result)
    }

    fn create_image(&self, image: &Image) -> Result<Content, FeedError> {
        if image.url.is_empty() {
            return Err(FeedError::missing("url"));
        }

        match image.rel.as_ref().map(|rel| rel.as_str()).filter(|rel| !rel.is_empty()) {
            Some(rel) => Content::with_value(rel.to_string(), image.url.clone()),
            None => Ok(Content::leaf(ICON, image.url.clone())),
        }
    }

    /// Plain items have no Atom-only fields; see [`AtomFormatter::create_entry`].
    fn create_item(&self, item: &Item) -> Result<Content, FeedError> {
        self.entry_content(item, None)
    }
}

/// XHTML for Atom text constructs, parsed XML for `<content>`, text otherwise.
fn atom_value_mode(content: &Content, media_type: Option<&str>) -> ValueMode {
    let is_atom = matches!(content.namespace(), None | Some(ATOM_NAMESPACE));
    if is_xhtml_media_type(media_type) && is_atom && TEXT_CONSTRUCTS.contains(&content.name()) {
        ValueMode::Xhtml
    } else if is_xml_media_type(media_type) && is_atom && content.name() == CONTENT {
        ValueMode::Xml
    } else {
        ValueMode::Text
    }
}

/// Puts `xmlns="http://www.w3.org/2005/Atom"` first unless an `xmlns*`
/// attribute already binds the Atom namespace.
pub(crate) fn ensure_atom_namespace(attributes: &[Attribute]) -> Vec<Attribute> {
    let mut list = attributes.to_vec();
    let declared = attributes
        .iter()
        .any(|a| a.name.starts_with("xmlns") && a.value == ATOM_NAMESPACE);
    if !declared {
        list.insert(0, Attribute::from_static("xmlns", ATOM_NAMESPACE));
    }
    list
}
