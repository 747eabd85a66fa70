//! Shared pieces for list queries built with `QueryBuilder`

use sqlx::{Postgres, QueryBuilder};

use crate::models::Pagination;

/// Tracks whether a WHERE clause has been opened.
#[derive(Debug, Default)]
pub(crate) struct Conditions {
    open: bool,
}

impl Conditions {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Push `WHERE` for the first condition and `AND` afterwards.
    pub(crate) fn next<'q, 'args>(
        &mut self,
        qb: &'q mut QueryBuilder<'args, Postgres>,
    ) -> &'q mut QueryBuilder<'args, Postgres> {
        qb.push(if self.open { " AND " } else { " WHERE " });
        self.open = true;
        qb
    }
}

/// Append `LIMIT`/`OFFSET` as bound values.
pub(crate) fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Pagination) {
    qb.push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
}

/// `%term%` with LIKE wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn where_then_and() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM entities");
        let mut cond = Conditions::new();
        cond.next(&mut qb).push("region = ").push_bind("EU".to_owned());
        cond.next(&mut qb).push("status = ").push_bind("active".to_owned());
        push_page(&mut qb, Pagination::default());

        assert_eq!(
            qb.sql(),
            "SELECT * FROM entities WHERE region = $1 AND status = $2 LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn no_conditions_no_where() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM entities");
        push_page(&mut qb, Pagination::new(5, 0));
        assert_eq!(qb.sql(), "SELECT * FROM entities LIMIT $1 OFFSET $2");
    }

    #[test]
    fn escapes_wildcards() {
        assert_eq!(like_pattern("acme"), "%acme%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
