mod genres;
mod id;
mod isbn;
mod title;
mod year;

pub use self::{genres::*, id::*, isbn::*, title::*, year::*};
use crate::entity::common::{CreatedAt, SortSafelist, Version};
use destructure::{Destructure, Mutation};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, References, Destructure, Mutation)]
pub struct Book {
    id: BookId,
    created_at: CreatedAt<Book>,
    title: BookTitle,
    year: BookYear,
    isbn: Isbn,
    genres: BookGenres,
    version: Version<Book>,
}

impl Book {
    pub const SORT_SAFELIST: SortSafelist = SortSafelist::new(&[
        "id", "title", "year", "isbn", "-id", "-title", "-year", "-isbn",
    ]);

    pub fn new(
        id: BookId,
        created_at: CreatedAt<Book>,
        title: BookTitle,
        year: BookYear,
        isbn: Isbn,
        genres: BookGenres,
        version: Version<Book>,
    ) -> Self {
        Self {
            id,
            created_at,
            title,
            year,
            isbn,
            genres,
            version,
        }
    }

    /// The caller-supplied fields, for validation before a rewrite.
    pub fn draft(&self) -> BookDraft {
        BookDraft {
            title: self.title.clone(),
            year: self.year,
            isbn: self.isbn,
            genres: self.genres.clone(),
        }
    }
}

// `created_at` stays internal to the store.
impl Serialize for Book {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut book = serializer.serialize_struct("Book", 6)?;
        book.serialize_field("id", &self.id)?;
        book.serialize_field("title", &self.title)?;
        book.serialize_field("year", &self.year)?;
        book.serialize_field("ISBN", &self.isbn)?;
        book.serialize_field("genres", &self.genres)?;
        book.serialize_field("version", &self.version)?;
        book.end()
    }
}

/// Fields a caller supplies to create a book. The store assigns the rest.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct BookDraft {
    pub title: BookTitle,
    pub year: BookYear,
    #[serde(rename = "ISBN")]
    pub isbn: Isbn,
    pub genres: BookGenres,
}

/// Partial update. `None` means the field was not supplied, which is distinct from
/// supplying an empty value such as `Some(BookGenres::default())`.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
pub struct BookPatch {
    pub title: Option<BookTitle>,
    pub year: Option<BookYear>,
    #[serde(rename = "ISBN")]
    pub isbn: Option<Isbn>,
    pub genres: Option<BookGenres>,
}

impl BookPatch {
    /// Rewrites the supplied fields of `book`. Id, creation time and version are kept.
    pub fn apply(self, book: Book) -> Book {
        book.reconstruct(|b| {
            if let Some(title) = self.title {
                b.title = title;
            }
            if let Some(year) = self.year {
                b.year = year;
            }
            if let Some(isbn) = self.isbn {
                b.isbn = isbn;
            }
            if let Some(genres) = self.genres {
                b.genres = genres;
            }
        })
    }
}
