use crate::entity::{Filter, Page, PageSize};
use crate::validate::Validator;

/// Gate that must pass before a [`Filter`] reaches a query. It is the only place an
/// unlisted sort key is turned away as a normal error.
pub fn validate_filter(v: &mut Validator, filter: &Filter) {
    let page = *filter.page().as_ref();
    v.check(page > 0, "page", "must be greater than zero");
    v.check(page <= Page::MAX, "page", "must be a maximum of 10 million");

    let page_size = *filter.page_size().as_ref();
    v.check(page_size > 0, "page_size", "must be greater than zero");
    v.check(page_size <= PageSize::MAX, "page_size", "must be a maximum of 100");

    v.check(
        filter.sort_safelist().permits(filter.sort()),
        "sort",
        "invalid sort value",
    );
}
