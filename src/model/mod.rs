//! Content model shared by the RSS and Atom encoders.
//!
//! - [`Content`] is the intermediate tree every domain object is converted into
//!   before rendering.
//! - [`Item`], [`AtomEntry`], [`Link`], [`Person`], [`Category`] and [`Image`] are
//!   the caller-owned domain objects; encoders only read them.

mod content;
mod item;
mod link;

use chrono::{DateTime, FixedOffset};

pub use content::{Attribute, Content};
pub(crate) use item::filled;
pub use item::{
    AtomEntry, Category, Image, ImageRel, Item, Person, PersonRel, PLAIN_TEXT_CONTENT_TYPE,
};
pub use link::{Link, LinkRel};

/// Timestamp type used throughout the model.
pub type Timestamp = DateTime<FixedOffset>;
