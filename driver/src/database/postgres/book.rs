use std::time::Duration;

use error_stack::Report;
use sqlx::PgConnection;
use time::OffsetDateTime;

use kernel::interface::query::BookQuery;
use kernel::interface::update::BookModifier;
use kernel::prelude::entity::{
    Book, BookDraft, BookGenres, BookId, BookTitle, BookYear, CreatedAt, Filter, Isbn, Metadata,
    Paginated, Version,
};
use kernel::KernelError;

use crate::database::postgres::{within, PostgresConnection};

#[derive(Debug, Clone, Copy)]
pub struct PostgresBookRepository {
    deadline: Duration,
}

impl PostgresBookRepository {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }
}

#[async_trait::async_trait]
impl BookQuery for PostgresBookRepository {
    type Transaction = PostgresConnection;

    async fn find_by_id(
        &self,
        con: &mut PostgresConnection,
        id: &BookId,
    ) -> error_stack::Result<Book, KernelError> {
        let result = PgBookInternal::find_by_id(con, self.deadline, id).await;
        con.track(result)
    }

    async fn find_all(
        &self,
        con: &mut PostgresConnection,
        title: &str,
        genres: &BookGenres,
        filter: &Filter,
    ) -> error_stack::Result<Paginated<Book>, KernelError> {
        let result = PgBookInternal::find_all(con, self.deadline, title, genres, filter).await;
        con.track(result)
    }
}

#[async_trait::async_trait]
impl BookModifier for PostgresBookRepository {
    type Transaction = PostgresConnection;

    async fn create(
        &self,
        con: &mut PostgresConnection,
        book: &BookDraft,
    ) -> error_stack::Result<Book, KernelError> {
        let result = PgBookInternal::create(con, self.deadline, book).await;
        con.track(result)
    }

    async fn update(
        &self,
        con: &mut PostgresConnection,
        book: Book,
    ) -> error_stack::Result<Book, KernelError> {
        let result = PgBookInternal::update(con, self.deadline, book).await;
        con.track(result)
    }

    async fn delete(
        &self,
        con: &mut PostgresConnection,
        book_id: &BookId,
    ) -> error_stack::Result<(), KernelError> {
        let result = PgBookInternal::delete(con, self.deadline, book_id).await;
        con.track(result)
    }
}

#[derive(sqlx::FromRow)]
struct BookRow {
    id: i64,
    created_at: OffsetDateTime,
    title: String,
    year: i32,
    isbn: i32,
    genres: Vec<String>,
    version: i32,
}

impl From<BookRow> for Book {
    fn from(value: BookRow) -> Self {
        Book::new(
            BookId::new(value.id),
            CreatedAt::new(value.created_at),
            BookTitle::new(value.title),
            BookYear::new(value.year),
            Isbn::new(value.isbn),
            BookGenres::new(value.genres),
            Version::new(value.version),
        )
    }
}

#[derive(sqlx::FromRow)]
struct BookPageRow {
    total_records: i64,
    #[sqlx(flatten)]
    book: BookRow,
}

#[derive(sqlx::FromRow)]
struct CreatedBookRow {
    id: i64,
    created_at: OffsetDateTime,
    version: i32,
}

pub(in crate::database) struct PgBookInternal;

impl PgBookInternal {
    #[tracing::instrument(skip(con, deadline))]
    async fn find_by_id(
        con: &mut PgConnection,
        deadline: Duration,
        id: &BookId,
    ) -> error_stack::Result<Book, KernelError> {
        if !id.is_valid() {
            return Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("Book id below minimum: {}", id.as_ref())));
        }
        let row = within(
            deadline,
            sqlx::query_as::<_, BookRow>(
                // language=postgresql
                r#"
                SELECT id, created_at, title, year, isbn, genres, version
                FROM books
                WHERE id = $1
                "#,
            )
            .bind(id.as_ref())
            .fetch_optional(con),
        )
        .await?;
        match row {
            Some(row) => Ok(Book::from(row)),
            None => Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("No book with id {}", id.as_ref()))),
        }
    }

    #[tracing::instrument(skip(con, deadline))]
    async fn find_all(
        con: &mut PgConnection,
        deadline: Duration,
        title: &str,
        genres: &BookGenres,
        filter: &Filter,
    ) -> error_stack::Result<Paginated<Book>, KernelError> {
        // Only safelist text is formatted in; every caller value is a bind parameter.
        let query = format!(
            // language=postgresql
            r#"
            SELECT count(*) OVER() AS total_records,
                   id, created_at, title, year, isbn, genres, version
            FROM books
            WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
            AND (genres @> $2 OR $2 = '{{}}')
            ORDER BY {} {}, id ASC
            LIMIT $3 OFFSET $4
            "#,
            filter.sort_column(),
            filter.sort_direction().as_sql(),
        );
        let rows = within(
            deadline,
            sqlx::query_as::<_, BookPageRow>(&query)
                .bind(title)
                .bind(genres.as_ref())
                .bind(*filter.limit().as_ref())
                .bind(*filter.offset().as_ref())
                .fetch_all(con),
        )
        .await?;

        let total_records = rows.first().map_or(0, |row| row.total_records);
        let metadata = Metadata::calculate(total_records, filter.page(), filter.page_size());
        let books = rows
            .into_iter()
            .map(|row| Book::from(row.book))
            .collect::<Vec<_>>();
        tracing::debug!(total_records, returned = books.len(), "books listed");
        Ok(Paginated::new(books, metadata))
    }

    #[tracing::instrument(skip(con, deadline))]
    async fn create(
        con: &mut PgConnection,
        deadline: Duration,
        book: &BookDraft,
    ) -> error_stack::Result<Book, KernelError> {
        let row = within(
            deadline,
            sqlx::query_as::<_, CreatedBookRow>(
                // language=postgresql
                r#"
                INSERT INTO books (title, year, isbn, genres)
                VALUES ($1, $2, $3, $4)
                RETURNING id, created_at, version
                "#,
            )
            .bind(book.title.as_ref())
            .bind(book.year.as_ref())
            .bind(book.isbn.as_ref())
            .bind(book.genres.as_ref())
            .fetch_one(con),
        )
        .await?;
        tracing::debug!(id = row.id, "book created");
        Ok(Book::new(
            BookId::new(row.id),
            CreatedAt::new(row.created_at),
            book.title.clone(),
            book.year,
            book.isbn,
            book.genres.clone(),
            Version::new(row.version),
        ))
    }

    #[tracing::instrument(skip(con, deadline))]
    async fn update(
        con: &mut PgConnection,
        deadline: Duration,
        book: Book,
    ) -> error_stack::Result<Book, KernelError> {
        let version = within(
            deadline,
            sqlx::query_scalar::<_, i32>(
                // language=postgresql
                r#"
                UPDATE books
                SET title = $1, year = $2, isbn = $3, genres = $4, version = version + 1
                WHERE id = $5 AND version = $6
                RETURNING version
                "#,
            )
            .bind(book.title().as_ref())
            .bind(book.year().as_ref())
            .bind(book.isbn().as_ref())
            .bind(book.genres().as_ref())
            .bind(book.id().as_ref())
            .bind(book.version().as_ref())
            .fetch_optional(con),
        )
        .await?;
        match version {
            Some(version) => {
                tracing::debug!(version, "book updated");
                Ok(book.reconstruct(|b| b.version = Version::new(version)))
            }
            None => {
                tracing::warn!("edit conflict");
                Err(Report::new(KernelError::Concurrency).attach_printable(format!(
                    "Book {} is no longer at version {}",
                    book.id().as_ref(),
                    book.version().as_ref()
                )))
            }
        }
    }

    #[tracing::instrument(skip(con, deadline))]
    async fn delete(
        con: &mut PgConnection,
        deadline: Duration,
        book_id: &BookId,
    ) -> error_stack::Result<(), KernelError> {
        if !book_id.is_valid() {
            return Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("Book id below minimum: {}", book_id.as_ref())));
        }
        let result = within(
            deadline,
            sqlx::query(
                // language=postgresql
                r#"
                DELETE FROM books
                WHERE id = $1
                "#,
            )
            .bind(book_id.as_ref())
            .execute(con),
        )
        .await?;
        if result.rows_affected() == 0 {
            return Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("No book with id {}", book_id.as_ref())));
        }
        Ok(())
    }
}
