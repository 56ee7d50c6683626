use hadith_wire::messages;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub title: String,
    pub short_description: String,
    pub language: String,
    pub book_count: u32,
    pub hadith_count: u32,
    pub has_books: bool,
}

impl Collection {
    /// Number of books the backend promised, when it is known up front.
    ///
    /// A collection flagged as having no books resolves to zero without a
    /// fetch. A zero count on a collection that does have books means the
    /// count was not sent, so it reads as unknown.
    pub fn declared_books(&self) -> Option<u32> {
        if !self.has_books {
            Some(0)
        } else if self.book_count > 0 {
            Some(self.book_count)
        } else {
            None
        }
    }
}

impl From<messages::Collection> for Collection {
    fn from(value: messages::Collection) -> Self {
        Self {
            id: value.id,
            title: value.title,
            short_description: value.short_description,
            language: value.language,
            book_count: value.book_count,
            hadith_count: value.hadith_count,
            has_books: value.has_books,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub collection_id: String,
    pub number: String,
    pub title: String,
    pub hadith_start: u32,
    pub hadith_end: u32,
    pub hadith_count: u32,
}

impl From<messages::Book> for Book {
    fn from(value: messages::Book) -> Self {
        Self {
            id: value.id,
            collection_id: value.collection_id,
            number: value.number,
            title: value.title,
            hadith_start: value.hadith_start,
            hadith_end: value.hadith_end,
            hadith_count: value.hadith_count,
        }
    }
}

/// One collection page: the collection and all of its books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionWithBooks {
    pub collection: Collection,
    pub books: Vec<Book>,
}

/// Sidebar entry. `books` is `None` when they are left for lazy expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationCollection {
    pub collection: Collection,
    pub books: Option<Vec<Book>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub source: String,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hadith {
    pub urn: String,
    pub collection_id: String,
    pub book_number: String,
    pub chapter_id: String,
    pub number: String,
    pub text: String,
    pub narrator: String,
    pub grades: Vec<Grade>,
}

impl From<messages::Hadith> for Hadith {
    fn from(value: messages::Hadith) -> Self {
        Self {
            urn: value.urn,
            collection_id: value.collection_id,
            book_number: value.book_number,
            chapter_id: value.chapter_id,
            number: value.number,
            text: value.text,
            narrator: value.narrator,
            grades: value
                .grades
                .into_iter()
                .map(|grade| Grade {
                    source: grade.source,
                    grade: grade.grade,
                })
                .collect(),
        }
    }
}

/// Account shown after login. Never carries the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
}

impl From<messages::User> for User {
    fn from(value: messages::User) -> Self {
        Self {
            id: value.id,
            username: value.username,
            email: value.email,
            email_verified: value.email_verified,
        }
    }
}

pub(crate) fn books_from_wire(books: Vec<messages::Book>) -> Vec<Book> {
    books.into_iter().map(Book::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(has_books: bool, book_count: u32) -> Collection {
        Collection::from(messages::Collection {
            id: "nawawi40".to_string(),
            has_books,
            book_count,
            ..Default::default()
        })
    }

    #[test]
    fn declared_books_reflects_wire_flags() {
        assert_eq!(collection(false, 0).declared_books(), Some(0));
        assert_eq!(collection(true, 97).declared_books(), Some(97));
        assert_eq!(collection(true, 0).declared_books(), None);
    }

    #[test]
    fn hadith_mapping_keeps_grade_order() {
        let hadith = Hadith::from(messages::Hadith {
            urn: "bukhari:1".to_string(),
            grades: vec![
                messages::Grade {
                    source: "Darussalam".to_string(),
                    grade: "Sahih".to_string(),
                },
                messages::Grade {
                    source: "Al-Albani".to_string(),
                    grade: "Sahih".to_string(),
                },
            ],
            ..Default::default()
        });
        let sources: Vec<&str> = hadith.grades.iter().map(|g| g.source.as_str()).collect();
        assert_eq!(sources, vec!["Darussalam", "Al-Albani"]);
    }

    #[test]
    fn book_mapping_keeps_non_numeric_numbers() {
        let book = Book::from(messages::Book {
            number: "introduction".to_string(),
            collection_id: "muslim".to_string(),
            ..Default::default()
        });
        assert_eq!(book.number, "introduction");
        assert_eq!(book.collection_id, "muslim");
    }
}
