use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Book, BookDraft, BookId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BookModifier: 'static + Sync + Send {
    type Transaction: Transaction;

    /// Persists a validated draft and returns it with the store-assigned id,
    /// creation time and initial version.
    async fn create(
        &self,
        con: &mut Self::Transaction,
        book: &BookDraft,
    ) -> error_stack::Result<Book, KernelError>;

    /// Rewrites the row if its stored version still equals `book.version()`, and
    /// returns `book` carrying the advanced version.
    ///
    /// Fails with `Concurrency` when the row changed or vanished since it was read.
    async fn update(
        &self,
        con: &mut Self::Transaction,
        book: Book,
    ) -> error_stack::Result<Book, KernelError>;

    async fn delete(
        &self,
        con: &mut Self::Transaction,
        book_id: &BookId,
    ) -> error_stack::Result<(), KernelError>;
}

pub trait DependOnBookModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type BookModifier: BookModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn book_modifier(&self) -> &Self::BookModifier;
}
