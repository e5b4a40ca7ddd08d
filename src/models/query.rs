//! Listing parameters shared by the book, member and loan endpoints

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

/// Search, ordering and pagination parameters
#[derive(Debug, Default, Clone, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Case-insensitive substring filter
    pub search: Option<String>,
    /// Sort field, prefix with `-` for descending order (e.g. `-created_at`)
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    /// Row offset of the requested page. Pages past the addressable range are rejected.
    pub fn offset(&self) -> AppResult<i64> {
        (self.page() - 1)
            .checked_mul(self.per_page())
            .ok_or_else(|| AppError::Validation(format!("Page {} is out of range", self.page())))
    }

    /// ILIKE pattern for the search term, `None` when no usable term was given
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern)
    }

    /// Resolve `ordering` against a whitelist of `(public name, SQL column)` pairs.
    ///
    /// Returns an `ORDER BY` body. Unknown fields are rejected rather than ignored.
    pub fn order_by(&self, allowed: &[(&str, &str)], default: &str) -> AppResult<String> {
        let raw = self
            .ordering
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default);

        let (field, direction) = match raw.strip_prefix('-') {
            Some(field) => (field, "DESC"),
            None => (raw, "ASC"),
        };

        allowed
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| format!("{} {}", column, direction))
            .ok_or_else(|| {
                let names: Vec<&str> = allowed.iter().map(|(name, _)| *name).collect();
                AppError::Validation(format!(
                    "Invalid ordering '{}', expected one of: {}",
                    field,
                    names.join(", ")
                ))
            })
    }
}

/// Wrap a user term in `%...%`, escaping LIKE metacharacters
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[(&str, &str)] = &[("title", "b.title"), ("created_at", "b.created_at")];

    #[test]
    fn test_ordering_descending_prefix() {
        let query = ListQuery {
            ordering: Some("-title".to_string()),
            ..Default::default()
        };
        assert_eq!(query.order_by(FIELDS, "title").unwrap(), "b.title DESC");
    }

    #[test]
    fn test_ordering_falls_back_to_default() {
        let query = ListQuery::default();
        assert_eq!(query.order_by(FIELDS, "-created_at").unwrap(), "b.created_at DESC");
    }

    #[test]
    fn test_ordering_rejects_unknown_field() {
        let query = ListQuery {
            ordering: Some("id; DROP TABLE books".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.order_by(FIELDS, "title"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_pagination_bounds() {
        let query = ListQuery {
            page: Some(0),
            per_page: Some(10_000),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 100);
        assert_eq!(query.offset().unwrap(), 0);

        let query = ListQuery {
            page: Some(3),
            per_page: Some(10),
            ..Default::default()
        };
        assert_eq!(query.offset().unwrap(), 20);
    }

    #[test]
    fn test_page_beyond_range_is_rejected() {
        let query = ListQuery {
            page: Some(i64::MAX),
            ..Default::default()
        };
        assert!(matches!(query.offset(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let query = ListQuery {
            search: Some("  50%_off ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.search_pattern().as_deref(), Some("%50\\%\\_off%"));

        let blank = ListQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.search_pattern(), None);
    }
}
