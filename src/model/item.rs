use crate::model::{Link, Timestamp};

/// Role of a [`Person`]. Unset means author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonRel {
    Author,
    Contributor,
    /// RSS allows other element names (e.g. `managingEditor`); Atom rejects them.
    Custom(String),
}

impl PersonRel {
    pub fn as_str(&self) -> &str {
        match self {
            PersonRel::Author => "author",
            PersonRel::Contributor => "contributor",
            PersonRel::Custom(rel) => rel,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub name: Option<String>,
    pub email: Option<String>,
    pub uri: Option<String>,
    pub rel: Option<PersonRel>,
}

impl Person {
    pub fn author(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn is_author(&self) -> bool {
        matches!(self.rel, None | Some(PersonRel::Author))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub scheme: Option<String>,
    pub label: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Role of an [`Image`] in Atom. Unset means icon; RSS ignores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRel {
    Icon,
    Logo,
    Custom(String),
}

impl ImageRel {
    pub fn as_str(&self) -> &str {
        match self {
            ImageRel::Icon => "icon",
            ImageRel::Logo => "logo",
            ImageRel::Custom(rel) => rel,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    pub url: String,
    pub title: Option<String>,
    pub link: Option<Link>,
    pub description: Option<String>,
    pub rel: Option<ImageRel>,
}

/// A single feed entry, shared by both formats.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub last_updated: Option<Timestamp>,
    pub published: Option<Timestamp>,
    pub links: Vec<Link>,
    pub contributors: Vec<Person>,
    pub categories: Vec<Category>,
}

impl Item {
    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    pub fn add_contributor(&mut self, person: Person) {
        self.contributors.push(person);
    }

    pub fn add_category(&mut self, category: Category) {
        self.categories.push(category);
    }
}

/// Plain-text Atom content type; `<content>` carries no `type` for it.
pub const PLAIN_TEXT_CONTENT_TYPE: &str = "text";

/// An [`Item`] with the Atom-only entry fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomEntry {
    pub item: Item,
    /// Media type of `item.description` when written as `<content>`
    /// (`text`, `html`, `xhtml` or an XML media type).
    pub content_type: Option<String>,
    pub summary: Option<String>,
    pub rights: Option<String>,
}

impl From<Item> for AtomEntry {
    fn from(item: Item) -> Self {
        Self {
            item,
            ..Self::default()
        }
    }
}

/// Returns the string when present and non-empty.
pub(crate) fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_relationship_defaults_to_author() {
        assert!(Person::author("Jane").is_author());

        let contributor = Person {
            rel: Some(PersonRel::Contributor),
            ..Person::author("Sam")
        };
        assert!(!contributor.is_author());
        assert_eq!(PersonRel::Custom("editor".into()).as_str(), "editor");
    }

    #[test]
    fn test_filled_skips_empty() {
        assert_eq!(filled(&None), None);
        assert_eq!(filled(&Some(String::new())), None);
        assert_eq!(filled(&Some("x".to_string())), Some("x"));
    }

    #[test]
    fn test_entry_from_item() {
        let mut item = Item::default();
        item.add_category(Category::new("rust"));
        item.add_contributor(Person::email("a@example.com"));

        let entry = AtomEntry::from(item.clone());
        assert_eq!(entry.item, item);
        assert!(entry.content_type.is_none());
        assert!(entry.summary.is_none());
    }
}
