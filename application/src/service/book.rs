use error_stack::Report;

use kernel::interface::database::{
    DatabaseConnection, DependOnDatabaseConnection, Transaction,
};
use kernel::interface::query::{BookQuery, DependOnBookQuery};
use kernel::interface::update::{BookModifier, DependOnBookModifier};
use kernel::interface::validate::{validate_book, validate_filter, Validator};
use kernel::prelude::entity::{BookDraft, BookGenres, BookId, Version};
use kernel::KernelError;

use crate::transfer::{
    BookDto, BookPageDto, CreateBookDto, DeleteBookDto, GetAllBookDto, GetBookDto, UpdateBookDto,
};

/// Commits on success. On failure rolls back and hands the original report on.
async fn settle<C, T>(
    connection: C,
    result: error_stack::Result<T, KernelError>,
) -> error_stack::Result<T, KernelError>
where
    C: Transaction,
    T: Send,
{
    match result {
        Ok(value) => {
            connection.commit().await?;
            Ok(value)
        }
        Err(report) => {
            if let Err(rollback) = connection.roll_back().await {
                tracing::warn!("roll back failed: {rollback:?}");
            }
            Err(report)
        }
    }
}

#[async_trait::async_trait]
pub trait GetBookService: 'static + Sync + Send + DependOnBookQuery {
    #[tracing::instrument(skip(self))]
    async fn get_book(&self, dto: GetBookDto) -> error_stack::Result<BookDto, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let id = BookId::new(dto.id);
        let book = self.book_query().find_by_id(&mut connection, &id).await;
        settle(connection, book).await.map(BookDto::from)
    }
}

impl<T> GetBookService for T where T: DependOnBookQuery {}

#[async_trait::async_trait]
pub trait GetAllBookService: 'static + Sync + Send + DependOnBookQuery {
    #[tracing::instrument(skip(self))]
    async fn get_all_books(
        &self,
        dto: GetAllBookDto,
    ) -> error_stack::Result<BookPageDto, KernelError> {
        let filter = dto.filter();
        let mut validator = Validator::new();
        validate_filter(&mut validator, &filter);
        validator.into_result()?;

        let genres = BookGenres::new(dto.genres);
        let mut connection = self.database_connection().transact().await?;
        let page = self
            .book_query()
            .find_all(&mut connection, &dto.title, &genres, &filter)
            .await;
        settle(connection, page).await.map(BookPageDto::from)
    }
}

impl<T> GetAllBookService for T where T: DependOnBookQuery {}

#[async_trait::async_trait]
pub trait CreateBookService: 'static + Sync + Send + DependOnBookModifier {
    #[tracing::instrument(skip(self))]
    async fn create_book(&self, dto: CreateBookDto) -> error_stack::Result<BookDto, KernelError> {
        let draft = BookDraft::from(dto);
        let mut validator = Validator::new();
        validate_book(&mut validator, &draft);
        validator.into_result()?;

        let mut connection = self.database_connection().transact().await?;
        let book = self.book_modifier().create(&mut connection, &draft).await;
        let book = settle(connection, book).await?;
        tracing::info!(id = book.id().as_ref(), "book created");
        Ok(BookDto::from(book))
    }
}

impl<T> CreateBookService for T where T: DependOnBookModifier {}

#[async_trait::async_trait]
pub trait UpdateBookService:
    'static + Sync + Send + DependOnBookQuery + DependOnBookModifier
{
    /// Reads the row, applies the supplied fields, validates the result and writes it
    /// back under the version that was read.
    #[tracing::instrument(skip(self))]
    async fn update_book(&self, dto: UpdateBookDto) -> error_stack::Result<BookDto, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let updated = async {
            let id = BookId::new(dto.id);
            let book = self.book_query().find_by_id(&mut connection, &id).await?;

            if let Some(expected) = dto.expected_version {
                if book.version() != &Version::new(expected) {
                    return Err(Report::new(KernelError::Concurrency).attach_printable(
                        format!(
                            "Book {} is at version {}, expected {expected}",
                            dto.id,
                            book.version().as_ref()
                        ),
                    ));
                }
            }

            let book = dto.patch().apply(book);
            let mut validator = Validator::new();
            validate_book(&mut validator, &book.draft());
            validator.into_result()?;

            self.book_modifier().update(&mut connection, book).await
        }
        .await;
        settle(connection, updated).await.map(BookDto::from)
    }
}

impl<T> UpdateBookService for T where T: DependOnBookQuery + DependOnBookModifier {}

#[async_trait::async_trait]
pub trait DeleteBookService: 'static + Sync + Send + DependOnBookModifier {
    #[tracing::instrument(skip(self))]
    async fn delete_book(&self, dto: DeleteBookDto) -> error_stack::Result<(), KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let id = BookId::new(dto.id);
        let deleted = self.book_modifier().delete(&mut connection, &id).await;
        settle(connection, deleted).await
    }
}

impl<T> DeleteBookService for T where T: DependOnBookModifier {}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use error_stack::Report;
    use time::OffsetDateTime;

    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::{BookQuery, DependOnBookQuery};
    use kernel::interface::update::{BookModifier, DependOnBookModifier};
    use kernel::interface::validate::ValidationErrors;
    use kernel::prelude::entity::{
        Book, BookDraft, BookGenres, BookId, CreatedAt, Filter, Metadata, Paginated, Version,
    };
    use kernel::KernelError;

    use super::{
        CreateBookService, DeleteBookService, GetAllBookService, GetBookService,
        UpdateBookService,
    };
    use crate::transfer::{
        CreateBookDto, DeleteBookDto, GetAllBookDto, GetBookDto, UpdateBookDto,
    };

    #[derive(Default)]
    struct State {
        books: BTreeMap<i64, Book>,
        next_id: i64,
        commits: usize,
        roll_backs: usize,
        listed: usize,
    }

    #[derive(Clone, Default)]
    struct MemoryStore {
        state: Arc<Mutex<State>>,
        books: MemoryBookRepository,
    }

    struct MemoryTransaction(Arc<Mutex<State>>);

    #[derive(Clone, Default)]
    struct MemoryBookRepository;

    #[async_trait::async_trait]
    impl Transaction for MemoryTransaction {
        async fn commit(self) -> error_stack::Result<(), KernelError> {
            self.0.lock().unwrap().commits += 1;
            Ok(())
        }

        async fn roll_back(self) -> error_stack::Result<(), KernelError> {
            self.0.lock().unwrap().roll_backs += 1;
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl DatabaseConnection for MemoryStore {
        type Transaction = MemoryTransaction;
        async fn transact(&self) -> error_stack::Result<MemoryTransaction, KernelError> {
            Ok(MemoryTransaction(self.state.clone()))
        }
    }

    impl DependOnBookQuery for MemoryStore {
        type BookQuery = MemoryBookRepository;
        fn book_query(&self) -> &MemoryBookRepository {
            &self.books
        }
    }

    impl DependOnBookModifier for MemoryStore {
        type BookModifier = MemoryBookRepository;
        fn book_modifier(&self) -> &MemoryBookRepository {
            &self.books
        }
    }

    #[async_trait::async_trait]
    impl BookQuery for MemoryBookRepository {
        type Transaction = MemoryTransaction;

        async fn find_by_id(
            &self,
            con: &mut MemoryTransaction,
            id: &BookId,
        ) -> error_stack::Result<Book, KernelError> {
            con.0
                .lock()
                .unwrap()
                .books
                .get(id.as_ref())
                .cloned()
                .ok_or_else(|| Report::new(KernelError::NotFound))
        }

        async fn find_all(
            &self,
            con: &mut MemoryTransaction,
            _title: &str,
            genres: &BookGenres,
            filter: &Filter,
        ) -> error_stack::Result<Paginated<Book>, KernelError> {
            // Panics for an unlisted sort key, like the real query builder.
            let _ = filter.sort_column();
            let mut state = con.0.lock().unwrap();
            state.listed += 1;
            let matching = state
                .books
                .values()
                .filter(|book| book.genres().is_superset_of(genres))
                .cloned()
                .collect::<Vec<_>>();
            let total = matching.len() as i64;
            let page = matching
                .into_iter()
                .skip(*filter.offset().as_ref() as usize)
                .take(*filter.limit().as_ref() as usize)
                .collect();
            Ok(Paginated::new(
                page,
                Metadata::calculate(total, filter.page(), filter.page_size()),
            ))
        }
    }

    #[async_trait::async_trait]
    impl BookModifier for MemoryBookRepository {
        type Transaction = MemoryTransaction;

        async fn create(
            &self,
            con: &mut MemoryTransaction,
            book: &BookDraft,
        ) -> error_stack::Result<Book, KernelError> {
            let mut state = con.0.lock().unwrap();
            state.next_id += 1;
            let id = state.next_id;
            let book = Book::new(
                BookId::new(id),
                CreatedAt::new(OffsetDateTime::now_utc()),
                book.title.clone(),
                book.year,
                book.isbn,
                book.genres.clone(),
                Version::initial(),
            );
            state.books.insert(id, book.clone());
            Ok(book)
        }

        async fn update(
            &self,
            con: &mut MemoryTransaction,
            book: Book,
        ) -> error_stack::Result<Book, KernelError> {
            let mut state = con.0.lock().unwrap();
            let stored = state.books.get(book.id().as_ref());
            if stored.map(|stored| stored.version()) != Some(book.version()) {
                return Err(Report::new(KernelError::Concurrency));
            }
            let version = book.version().next();
            let book = book.reconstruct(|b| b.version = version);
            state.books.insert(*book.id().as_ref(), book.clone());
            Ok(book)
        }

        async fn delete(
            &self,
            con: &mut MemoryTransaction,
            book_id: &BookId,
        ) -> error_stack::Result<(), KernelError> {
            let mut state = con.0.lock().unwrap();
            state
                .books
                .remove(book_id.as_ref())
                .map(|_| ())
                .ok_or_else(|| Report::new(KernelError::NotFound))
        }
    }

    fn create_dto(title: &str, genres: &[&str]) -> CreateBookDto {
        CreateBookDto {
            title: title.to_string(),
            year: 1953,
            isbn: 345342968,
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn counters(store: &MemoryStore) -> (usize, usize) {
        let state = store.state.lock().unwrap();
        (state.commits, state.roll_backs)
    }

    #[tokio::test]
    async fn create_then_get() -> error_stack::Result<(), KernelError> {
        let store = MemoryStore::default();
        let created = store
            .create_book(create_dto("Fahrenheit 451", &["dystopia"]))
            .await?;
        assert_eq!(created.id, 1);
        assert_eq!(created.version, 1);

        let found = store.get_book(GetBookDto { id: created.id }).await?;
        assert_eq!(found, created);
        assert_eq!(counters(&store), (2, 0));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_store() {
        let store = MemoryStore::default();
        let report = store
            .create_book(create_dto("", &["dystopia", "dystopia"]))
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Validation);
        let errors = report.downcast_ref::<ValidationErrors>().unwrap();
        assert_eq!(errors.get("title"), Some("must be provided"));
        assert_eq!(
            errors.get("genres"),
            Some("must not contain duplicate values")
        );
        assert!(store.state.lock().unwrap().books.is_empty());
        assert_eq!(counters(&store), (0, 0));
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() -> error_stack::Result<(), KernelError> {
        let store = MemoryStore::default();
        let created = store
            .create_book(create_dto("Fahrenheit 451", &["dystopia"]))
            .await?;

        let updated = store
            .update_book(UpdateBookDto {
                id: created.id,
                year: Some(1954),
                ..UpdateBookDto::default()
            })
            .await?;
        assert_eq!(updated.year, 1954);
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.genres, created.genres);
        assert_eq!(updated.version, 2);
        Ok(())
    }

    #[tokio::test]
    async fn update_with_invalid_patch_rolls_back() -> error_stack::Result<(), KernelError> {
        let store = MemoryStore::default();
        let created = store
            .create_book(create_dto("Fahrenheit 451", &["dystopia"]))
            .await?;

        let report = store
            .update_book(UpdateBookDto {
                id: created.id,
                genres: Some(Vec::new()),
                ..UpdateBookDto::default()
            })
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Validation);

        let found = store.get_book(GetBookDto { id: created.id }).await?;
        assert_eq!(found, created);
        assert_eq!(counters(&store), (2, 1));
        Ok(())
    }

    #[tokio::test]
    async fn stale_expected_version_is_conflict() -> error_stack::Result<(), KernelError> {
        let store = MemoryStore::default();
        let created = store
            .create_book(create_dto("Fahrenheit 451", &["dystopia"]))
            .await?;
        store
            .update_book(UpdateBookDto {
                id: created.id,
                title: Some("Fahrenheit 451 (1953)".to_string()),
                expected_version: Some(1),
                ..UpdateBookDto::default()
            })
            .await?;

        let report = store
            .update_book(UpdateBookDto {
                id: created.id,
                title: Some("Lost update".to_string()),
                expected_version: Some(1),
                ..UpdateBookDto::default()
            })
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Concurrency);

        let found = store.get_book(GetBookDto { id: created.id }).await?;
        assert_eq!(found.title, "Fahrenheit 451 (1953)");
        assert_eq!(found.version, 2);
        Ok(())
    }

    #[tokio::test]
    async fn missing_book_is_not_found() {
        let store = MemoryStore::default();
        let report = store
            .update_book(UpdateBookDto {
                id: 42,
                ..UpdateBookDto::default()
            })
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::NotFound);

        let report = store
            .delete_book(DeleteBookDto { id: 42 })
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::NotFound);
        assert_eq!(counters(&store), (0, 2));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() -> error_stack::Result<(), KernelError> {
        let store = MemoryStore::default();
        let created = store
            .create_book(create_dto("Fahrenheit 451", &["dystopia"]))
            .await?;
        store.delete_book(DeleteBookDto { id: created.id }).await?;
        let report = store
            .get_book(GetBookDto { id: created.id })
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn list_pages_and_filters_genres() -> error_stack::Result<(), KernelError> {
        let store = MemoryStore::default();
        for n in 0..25 {
            let genres: &[&str] = if n % 2 == 0 { &["poetry"] } else { &["prose"] };
            store
                .create_book(create_dto(&format!("Book {n}"), genres))
                .await?;
        }

        let page = store
            .get_all_books(GetAllBookDto {
                page_size: 10,
                ..GetAllBookDto::default()
            })
            .await?;
        assert_eq!(page.books.len(), 10);
        assert_eq!(*page.metadata.last_page(), 3);
        assert_eq!(*page.metadata.total_records(), 25);

        let poetry = store
            .get_all_books(GetAllBookDto {
                genres: vec!["poetry".to_string()],
                ..GetAllBookDto::default()
            })
            .await?;
        assert_eq!(poetry.books.len(), 13);
        assert!(poetry.books.iter().all(|b| b.genres == ["poetry"]));
        Ok(())
    }

    #[tokio::test]
    async fn unlisted_sort_is_rejected_before_query() {
        let store = MemoryStore::default();
        let report = store
            .get_all_books(GetAllBookDto {
                sort: "created_at".to_string(),
                ..GetAllBookDto::default()
            })
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Validation);
        let errors = report.downcast_ref::<ValidationErrors>().unwrap();
        assert_eq!(errors.get("sort"), Some("invalid sort value"));
        assert_eq!(store.state.lock().unwrap().listed, 0);
    }

    #[tokio::test]
    async fn empty_listing_has_zero_metadata() -> error_stack::Result<(), KernelError> {
        let store = MemoryStore::default();
        let page = store.get_all_books(GetAllBookDto::default()).await?;
        assert!(page.books.is_empty());
        assert_eq!(page.metadata, Metadata::default());
        Ok(())
    }
}
