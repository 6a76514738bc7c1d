use time::OffsetDateTime;

use crate::entity::{BookDraft, BookGenres, BookTitle, BookYear};
use crate::validate::{unique, Validator};

pub fn validate_book(v: &mut Validator, book: &BookDraft) {
    validate_book_in_year(v, book, OffsetDateTime::now_utc().year());
}

pub(crate) fn validate_book_in_year(v: &mut Validator, book: &BookDraft, current_year: i32) {
    let title: &String = book.title.as_ref();
    v.check(!title.is_empty(), "title", "must be provided");
    v.check(
        title.len() <= BookTitle::MAX_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );

    let year = *book.year.as_ref();
    v.check(year != 0, "year", "must be provided");
    v.check(year >= BookYear::EARLIEST, "year", "must be greater than 1888");
    v.check(year <= current_year, "year", "must not be in the future");

    let isbn = *book.isbn.as_ref();
    v.check(isbn != 0, "ISBN", "must be provided");
    v.check(isbn > 0, "ISBN", "must be a positive integer");

    let genres: &Vec<String> = book.genres.as_ref();
    v.check(
        genres.len() >= BookGenres::MIN_LEN,
        "genres",
        "must contain at least 1 genre",
    );
    v.check(
        genres.len() <= BookGenres::MAX_LEN,
        "genres",
        "must not contain more than 5 genres",
    );
    v.check(unique(genres), "genres", "must not contain duplicate values");
}
