use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Book, BookGenres, BookId, Filter, Paginated};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BookQuery: 'static + Sync + Send {
    type Transaction: Transaction;

    /// Fails with `NotFound` when no row has `id`, without touching the store when
    /// `id` is below the minimum.
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &BookId,
    ) -> error_stack::Result<Book, KernelError>;

    /// One page of books whose title matches `title` and whose genres include every
    /// genre of `genres`. An empty `title` or empty `genres` matches everything.
    ///
    /// `filter` must already have passed `validate_filter`.
    async fn find_all(
        &self,
        con: &mut Self::Transaction,
        title: &str,
        genres: &BookGenres,
        filter: &Filter,
    ) -> error_stack::Result<Paginated<Book>, KernelError>;
}

pub trait DependOnBookQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type BookQuery: BookQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn book_query(&self) -> &Self::BookQuery;
}
