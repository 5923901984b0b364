use std::str::FromStr;

use futures::future::BoxFuture;

use crate::feed::FeedError;
use crate::model::{Category, Content, Image, Item, Link, Person};

/// Kind of element under a reader's cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    None,
    Item,
    Link,
    Person,
    Image,
    Content,
    Category,
}

/// Cursor-style reading contract matching what the encoders write.
///
/// No parser ships with this crate; the trait fixes the shape so readers and
/// writers for the same format can share domain objects. Every read is
/// asynchronous so a reader can sit on a blocking or async source alike.
pub trait FeedReader: Send {
    fn element_type(&self) -> ElementType;

    fn element_name(&self) -> &str;

    /// Advances to the next element. Returns `false` at the end of the feed.
    fn read(&mut self) -> BoxFuture<'_, Result<bool, FeedError>>;

    /// Skips the current element and its children.
    fn skip(&mut self) -> BoxFuture<'_, Result<(), FeedError>>;

    fn read_item(&mut self) -> BoxFuture<'_, Result<Item, FeedError>>;

    fn read_link(&mut self) -> BoxFuture<'_, Result<Link, FeedError>>;

    fn read_person(&mut self) -> BoxFuture<'_, Result<Person, FeedError>>;

    fn read_image(&mut self) -> BoxFuture<'_, Result<Image, FeedError>>;

    fn read_content(&mut self) -> BoxFuture<'_, Result<Content, FeedError>>;

    fn read_category(&mut self) -> BoxFuture<'_, Result<Category, FeedError>>;

    /// Reads the current element as raw markup.
    fn read_element_as_string(&mut self) -> BoxFuture<'_, Result<String, FeedError>>;

    /// Reads the current element's text and parses it as `T`.
    fn read_value<T>(&mut self) -> BoxFuture<'_, Result<T, FeedError>>
    where
        T: FromStr + Send + 'static,
        Self: Sized,
    {
        Box::pin(async move {
            let content = self.read_content().await?;
            let text = content.value().unwrap_or_default();
            text.trim().parse::<T>().map_err(|_| FeedError::InvalidValue {
                value: text.to_string(),
            })
        })
    }
}
