use std::time::Duration;

use chrono::{DateTime, Utc, Weekday};
use url::Url;

use crate::feed::atom::{self, ensure_atom_namespace, AtomFormatter, ATOM_NAMESPACE};
use crate::feed::formatter::{FeedValue, Formatter};
use crate::feed::rss::{self, RssFormatter, RSS_SPECIFICATION_LINK, RSS_VERSION};
use crate::feed::FeedError;
use crate::model::{AtomEntry, Attribute, Category, Content, Image, Item, Link, Person, Timestamp};
use crate::util::{render_start_tag, split_name, FeedSink};

/// Opening and closing markup around a document's fragments.
#[derive(Debug)]
struct Envelope {
    root: &'static str,
    open: String,
    close: String,
    started: bool,
}

/// Writes formatted fragments to a sink.
///
/// Every `write_*` call asks the bound formatter to build and render the
/// content, then appends the result as raw output. Validation failures
/// surface before anything is written for that object.
///
/// The RSS and Atom writers ([`RssFeedWriter`], [`AtomFeedWriter`]) add a
/// document envelope that is opened lazily on the first write.
pub struct FeedWriter<S, F> {
    sink: S,
    formatter: F,
    envelope: Option<Envelope>,
}

pub type RssFeedWriter<S> = FeedWriter<S, RssFormatter>;
pub type AtomFeedWriter<S> = FeedWriter<S, AtomFormatter>;

impl<S: FeedSink, F: Formatter> FeedWriter<S, F> {
    /// A writer that emits bare fragments with no document envelope.
    pub fn from_parts(sink: S, formatter: F) -> Self {
        Self {
            sink,
            formatter,
            envelope: None,
        }
    }

    pub fn formatter(&self) -> &F {
        &self.formatter
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Appends a pre-rendered fragment, opening the envelope first if needed.
    pub async fn write_raw(&mut self, fragment: &str) -> Result<(), FeedError> {
        if let Some(envelope) = self.envelope.as_mut() {
            if !envelope.started {
                self.sink.write_raw(&envelope.open).await?;
                envelope.started = true;
                tracing::debug!(
                    root = envelope.root,
                    async_sink = self.sink.is_async(),
                    "Opened feed document"
                );
            }
        }
        self.sink.write_raw(fragment).await?;
        Ok(())
    }

    pub async fn write_content(&mut self, content: &Content) -> Result<(), FeedError> {
        let fragment = self.formatter.format(content)?;
        self.write_raw(&fragment).await
    }

    pub async fn write_item(&mut self, item: &Item) -> Result<(), FeedError> {
        let fragment = self.formatter.format_item(item)?;
        self.write_raw(&fragment).await
    }

    pub async fn write_link(&mut self, link: &Link) -> Result<(), FeedError> {
        let fragment = self.formatter.format_link(link)?;
        self.write_raw(&fragment).await
    }

    pub async fn write_person(&mut self, person: &Person) -> Result<(), FeedError> {
        let fragment = self.formatter.format_person(person)?;
        self.write_raw(&fragment).await
    }

    pub async fn write_category(&mut self, category: &Category) -> Result<(), FeedError> {
        let fragment = self.formatter.format_category(category)?;
        self.write_raw(&fragment).await
    }

    pub async fn write_image(&mut self, image: &Image) -> Result<(), FeedError> {
        let fragment = self.formatter.format_image(image)?;
        self.write_raw(&fragment).await
    }

    /// Writes `<name>value</name>` using the formatter's value rules
    /// (dates in the format's representation).
    pub async fn write_value<T: FeedValue + ?Sized>(
        &mut self,
        name: &str,
        value: &T,
    ) -> Result<(), FeedError> {
        if name.is_empty() {
            return Err(FeedError::missing("name"));
        }
        let value = self
            .formatter
            .format_value(value)
            .ok_or_else(|| FeedError::MissingValue {
                name: name.to_string(),
            })?;
        let content = Content::with_value(name.to_string(), value)?;
        self.write_content(&content).await
    }

    pub async fn flush(&mut self) -> Result<(), FeedError> {
        self.sink.flush().await?;
        Ok(())
    }

    /// Closes the document (opening it first if nothing was written),
    /// flushes, and returns the sink.
    pub async fn finish(mut self) -> Result<S, FeedError> {
        if let Some(envelope) = self.envelope.take() {
            if !envelope.started {
                self.sink.write_raw(&envelope.open).await?;
            }
            self.sink.write_raw(&envelope.close).await?;
            tracing::debug!(root = envelope.root, "Closed feed document");
        }
        self.sink.flush().await?;
        Ok(self.sink)
    }

    /// Returns the sink without closing the document.
    pub fn into_inner(self) -> S {
        self.sink
    }
}

fn require_timestamp(value: &Timestamp, field: &'static str) -> Result<(), FeedError> {
    if *value == DateTime::<Utc>::default() {
        return Err(FeedError::OutOfRange {
            field,
            reason: "must not be the default timestamp",
        });
    }
    Ok(())
}

impl<S: FeedSink> FeedWriter<S, RssFormatter> {
    /// An RSS 2.0 writer. `attributes` are written on `<rss>` and primed into
    /// the formatter so extension prefixes resolve.
    pub fn new(sink: S, attributes: &[Attribute]) -> Result<Self, FeedError> {
        let formatter = RssFormatter::with_attributes(attributes)?;
        Self::with_formatter(sink, attributes, formatter)
    }

    pub fn with_formatter(
        sink: S,
        attributes: &[Attribute],
        formatter: RssFormatter,
    ) -> Result<Self, FeedError> {
        let mut root = attributes.to_vec();
        root.push(Attribute::from_static(rss::names::VERSION, RSS_VERSION));
        let open = format!(
            "{}<{}>",
            render_start_tag(rss::names::RSS, &root)?,
            rss::names::CHANNEL
        );

        Ok(Self {
            sink,
            formatter,
            envelope: Some(Envelope {
                root: rss::names::RSS,
                open,
                close: format!("</{}></{}>", rss::names::CHANNEL, rss::names::RSS),
                started: false,
            }),
        })
    }

    pub async fn write_title(&mut self, title: &str) -> Result<(), FeedError> {
        self.write_value(rss::names::TITLE, title).await
    }

    pub async fn write_description(&mut self, description: &str) -> Result<(), FeedError> {
        self.write_value(rss::names::DESCRIPTION, description).await
    }

    /// `language` is a language tag such as `en-US`.
    pub async fn write_language(&mut self, language: &str) -> Result<(), FeedError> {
        if language.is_empty() {
            return Err(FeedError::missing("language"));
        }
        self.write_value(rss::names::LANGUAGE, language).await
    }

    pub async fn write_copyright(&mut self, copyright: &str) -> Result<(), FeedError> {
        self.write_value(rss::names::COPYRIGHT, copyright).await
    }

    pub async fn write_pub_date(&mut self, date: &Timestamp) -> Result<(), FeedError> {
        require_timestamp(date, "pub_date")?;
        self.write_value(rss::names::PUB_DATE, date).await
    }

    pub async fn write_last_build_date(&mut self, date: &Timestamp) -> Result<(), FeedError> {
        require_timestamp(date, "last_build_date")?;
        self.write_value(rss::names::LAST_BUILD_DATE, date).await
    }

    pub async fn write_generator(&mut self, generator: &str) -> Result<(), FeedError> {
        self.write_value(rss::names::GENERATOR, generator).await
    }

    pub async fn write_docs(&mut self) -> Result<(), FeedError> {
        self.write_value(rss::names::DOCS, RSS_SPECIFICATION_LINK).await
    }

    /// `<cloud>` for rssCloud notifications. `uri` must be absolute;
    /// `protocol` defaults to `xml-rpc`.
    pub async fn write_cloud(
        &mut self,
        uri: &str,
        register_procedure: &str,
        protocol: Option<&str>,
    ) -> Result<(), FeedError> {
        let uri = Url::parse(uri)?;
        if register_procedure.is_empty() {
            return Err(FeedError::missing("register_procedure"));
        }
        let domain = uri.host_str().ok_or(FeedError::missing("host"))?;
        let port = uri
            .port_or_known_default()
            .ok_or(FeedError::missing("port"))?;
        let path = match uri.query() {
            Some(query) => format!("{}?{}", uri.path(), query),
            None => uri.path().to_string(),
        };

        let mut cloud = Content::element(rss::names::CLOUD);
        cloud.add_attribute(Attribute::new("domain", domain.to_string()));
        cloud.add_attribute(Attribute::new("port", port.to_string()));
        cloud.add_attribute(Attribute::new("path", path));
        cloud.add_attribute(Attribute::new(
            "registerProcedure",
            register_procedure.to_string(),
        ));
        cloud.add_attribute(Attribute::new(
            "protocol",
            protocol.unwrap_or("xml-rpc").to_string(),
        ));
        self.write_content(&cloud).await
    }

    /// `<ttl>` in whole minutes, rounded up, at least 1.
    pub async fn write_time_to_live(&mut self, ttl: Duration) -> Result<(), FeedError> {
        if ttl.is_zero() {
            return Err(FeedError::OutOfRange {
                field: "ttl",
                reason: "must be greater than zero",
            });
        }
        let seconds = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
        let minutes = seconds.div_ceil(60).max(1);
        self.write_value(rss::names::TTL, &minutes).await
    }

    pub async fn write_skip_hours(&mut self, hours: &[u8]) -> Result<(), FeedError> {
        let mut skip_hours = Content::element(rss::names::SKIP_HOURS);
        for hour in hours {
            if *hour > 23 {
                return Err(FeedError::OutOfRange {
                    field: "hour",
                    reason: "must be between 0 and 23",
                });
            }
            skip_hours.add_field(Content::leaf(rss::names::HOUR, hour.to_string()));
        }
        self.write_content(&skip_hours).await
    }

    pub async fn write_skip_days(&mut self, days: &[Weekday]) -> Result<(), FeedError> {
        let mut skip_days = Content::element(rss::names::SKIP_DAYS);
        for day in days {
            let name = self
                .formatter
                .format_value(day)
                .ok_or(FeedError::missing("day"))?;
            skip_days.add_field(Content::leaf(rss::names::DAY, name));
        }
        self.write_content(&skip_days).await
    }
}

impl<S: FeedSink> FeedWriter<S, AtomFormatter> {
    /// An Atom 1.0 writer. The Atom namespace is declared on `<feed>` unless
    /// `attributes` already bind it.
    pub fn new(sink: S, attributes: &[Attribute]) -> Result<Self, FeedError> {
        let formatter = AtomFormatter::with_attributes(attributes)?;
        Self::with_formatter(sink, attributes, formatter)
    }

    pub fn with_formatter(
        sink: S,
        attributes: &[Attribute],
        formatter: AtomFormatter,
    ) -> Result<Self, FeedError> {
        let attributes = ensure_atom_namespace(attributes);
        // A prefixed Atom binding (`xmlns:atom`) makes the root `atom:feed`
        let name = attributes
            .iter()
            .filter(|a| a.is_namespace_declaration() && a.value == ATOM_NAMESPACE)
            .find_map(|a| match split_name(&a.name) {
                (Some(_), prefix) => Some(format!("{prefix}:{}", atom::names::FEED)),
                (None, _) => None,
            })
            .unwrap_or_else(|| atom::names::FEED.to_string());

        Ok(Self {
            sink,
            formatter,
            envelope: Some(Envelope {
                root: atom::names::FEED,
                open: render_start_tag(&name, &attributes)?,
                close: format!("</{name}>"),
                started: false,
            }),
        })
    }

    pub async fn write_entry(&mut self, entry: &AtomEntry) -> Result<(), FeedError> {
        let fragment = self.formatter.format_entry(entry)?;
        self.write_raw(&fragment).await
    }

    pub async fn write_id(&mut self, id: &str) -> Result<(), FeedError> {
        if id.is_empty() {
            return Err(FeedError::missing("id"));
        }
        self.write_value(atom::names::ID, id).await
    }

    pub async fn write_title(&mut self, title: &str) -> Result<(), FeedError> {
        self.write_value(atom::names::TITLE, title).await
    }

    pub async fn write_subtitle(&mut self, subtitle: &str) -> Result<(), FeedError> {
        self.write_value(atom::names::SUBTITLE, subtitle).await
    }

    pub async fn write_rights(&mut self, rights: &str) -> Result<(), FeedError> {
        self.write_value(atom::names::RIGHTS, rights).await
    }

    pub async fn write_updated(&mut self, updated: &Timestamp) -> Result<(), FeedError> {
        require_timestamp(updated, "updated")?;
        self.write_value(atom::names::UPDATED, updated).await
    }

    pub async fn write_generator(
        &mut self,
        name: &str,
        uri: Option<&str>,
        version: Option<&str>,
    ) -> Result<(), FeedError> {
        let mut generator = Content::with_value(atom::names::GENERATOR, name)?;
        if let Some(uri) = uri.filter(|u| !u.is_empty()) {
            generator.add_attribute(Attribute::new(atom::names::URI, uri.to_string()));
        }
        if let Some(version) = version.filter(|v| !v.is_empty()) {
            generator.add_attribute(Attribute::new(atom::names::VERSION, version.to_string()));
        }
        self.write_content(&generator).await
    }
}
