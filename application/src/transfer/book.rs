use time::OffsetDateTime;

use kernel::prelude::entity::{
    Book, BookDraft, BookGenres, BookPatch, BookTitle, BookYear, DestructBook, Filter, Isbn,
    Metadata, Page, PageSize, Paginated,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDto {
    pub id: i64,
    pub created_at: OffsetDateTime,
    pub title: String,
    pub year: i32,
    pub isbn: i32,
    pub genres: Vec<String>,
    pub version: i32,
}

impl From<Book> for BookDto {
    fn from(value: Book) -> Self {
        let DestructBook {
            id,
            created_at,
            title,
            year,
            isbn,
            genres,
            version,
        } = value.into_destruct();
        Self {
            id: id.into(),
            created_at: created_at.into(),
            title: title.into(),
            year: year.into(),
            isbn: isbn.into(),
            genres: genres.into(),
            version: version.into(),
        }
    }
}

#[derive(Debug)]
pub struct GetBookDto {
    pub id: i64,
}

#[derive(Debug)]
pub struct CreateBookDto {
    pub title: String,
    pub year: i32,
    pub isbn: i32,
    pub genres: Vec<String>,
}

impl From<CreateBookDto> for BookDraft {
    fn from(value: CreateBookDto) -> Self {
        BookDraft {
            title: BookTitle::new(value.title),
            year: BookYear::new(value.year),
            isbn: Isbn::new(value.isbn),
            genres: BookGenres::new(value.genres),
        }
    }
}

/// Fields left `None` keep their stored value.
#[derive(Debug, Default)]
pub struct UpdateBookDto {
    pub id: i64,
    /// Version the caller read. When given, the update is refused unless the row is
    /// still at it.
    pub expected_version: Option<i32>,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub isbn: Option<i32>,
    pub genres: Option<Vec<String>>,
}

impl UpdateBookDto {
    pub(crate) fn patch(&self) -> BookPatch {
        BookPatch {
            title: self.title.clone().map(BookTitle::new),
            year: self.year.map(BookYear::new),
            isbn: self.isbn.map(Isbn::new),
            genres: self.genres.clone().map(BookGenres::new),
        }
    }
}

#[derive(Debug)]
pub struct DeleteBookDto {
    pub id: i64,
}

#[derive(Debug)]
pub struct GetAllBookDto {
    /// Full-text match on the title. Empty matches every title.
    pub title: String,
    /// Every listed genre must be present. Empty matches every book.
    pub genres: Vec<String>,
    pub page: i32,
    pub page_size: i32,
    pub sort: String,
}

impl Default for GetAllBookDto {
    fn default() -> Self {
        Self {
            title: String::new(),
            genres: Vec::new(),
            page: *Page::default().as_ref(),
            page_size: *PageSize::default().as_ref(),
            sort: Filter::DEFAULT_SORT.to_string(),
        }
    }
}

impl GetAllBookDto {
    pub(crate) fn filter(&self) -> Filter {
        Filter::new(
            Page::new(self.page),
            PageSize::new(self.page_size),
            self.sort.clone(),
            Book::SORT_SAFELIST,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookPageDto {
    pub books: Vec<BookDto>,
    pub metadata: Metadata,
}

impl From<Paginated<Book>> for BookPageDto {
    fn from(value: Paginated<Book>) -> Self {
        let (books, metadata) = value.into_parts();
        Self {
            books: books.into_iter().map(BookDto::from).collect(),
            metadata,
        }
    }
}
