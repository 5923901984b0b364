//! Feed encoding for RSS 2.0 and Atom 1.0.
//!
//! This module turns domain objects into feed XML:
//!
//! - **Formatting**: [`Formatter`] builds a validated [`Content`](crate::model::Content)
//!   tree from a domain object and renders it to an XML fragment
//! - **Writing**: [`FeedWriter`] appends formatted fragments to a sink, and the
//!   RSS/Atom writers wrap them in a document envelope
//! - **Reading**: [`FeedReader`] is the matching cursor contract
//!
//! # Architecture
//!
//! - [`rss`] - RSS 2.0 encoder and element names
//! - [`atom`] - Atom 1.0 encoder and element names
//! - [`formatter`] - the encoder trait and scalar value formatting
//! - [`writer`] - fragment writer and channel-level convenience writers
//!
//! # Example
//!
//! ```ignore
//! use syndic::feed::RssFeedWriter;
//! use syndic::util::BlockingSink;
//!
//! let mut writer = RssFeedWriter::new(BlockingSink::new(Vec::new()), &[])?;
//! writer.write_title("Blog").await?;
//! writer.write_item(&item).await?;
//! let bytes = writer.finish().await?.into_inner();
//! ```

pub mod atom;
mod error;
pub mod formatter;
mod reader;
pub mod rss;
pub mod writer;

pub use atom::{AtomFormatter, ATOM_NAMESPACE};
pub use error::FeedError;
pub use formatter::{DateFormat, FeedValue, Formatter};
pub use reader::{ElementType, FeedReader};
pub use rss::{RssFormatter, RSS_SPECIFICATION_LINK, RSS_VERSION};
pub use writer::{AtomFeedWriter, FeedWriter, RssFeedWriter};
