//! Normalized list-retrieval options built from request query parameters

use std::collections::HashMap;

use super::filter::{FilterCondition, FilterField, SortSpec};

/// Query parameter carrying the sort token
pub const SORT_PARAM: &str = "sortBy";

/// Query parameter carrying the page size
pub const LIMIT_PARAM: &str = "limit";

/// Query parameter carrying the 1-indexed page number
pub const PAGE_PARAM: &str = "page";

/// Store-facing result window
///
/// # Example
///
/// ```rust
/// use storefront::query::Pagination;
///
/// let window = Pagination::clamped(-5, -20);
/// assert_eq!(window.offset, 0);
/// assert_eq!(window.limit, 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of results to skip
    pub offset: u64,
    /// Maximum number of results to return
    pub limit: u64,
}

impl Pagination {
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Clamp a signed window: a negative limit counts as its absolute value,
    /// a negative offset as zero
    #[must_use]
    pub fn clamped(offset: i64, limit: i64) -> Self {
        Self {
            offset: u64::try_from(offset).unwrap_or(0),
            limit: limit.unsigned_abs(),
        }
    }
}

/// Normalized `{filter, sort, page size, page offset}` for one list request
///
/// Building never fails. Keys outside the resource's allow-list are ignored,
/// unparseable or zero `limit`/`page` values count as absent, and negative
/// values are kept as given.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use storefront::query::{FilterField, QueryOptions};
///
/// let allowed = [FilterField::text("name"), FilterField::text("role")];
/// let params = HashMap::from([
///     ("name".to_string(), "Foo".to_string()),
///     ("password".to_string(), "ignored".to_string()),
///     ("sortBy".to_string(), "role:desc".to_string()),
///     ("limit".to_string(), "2".to_string()),
///     ("page".to_string(), "2".to_string()),
/// ]);
///
/// let options = QueryOptions::from_params(&params, &allowed);
/// assert_eq!(options.filters.len(), 1);
/// assert_eq!(options.page_size(), Some(2));
/// assert_eq!(options.page_offset(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Equality conditions, all of which must match
    pub filters: Vec<FilterCondition>,
    /// Optional single-field ordering
    pub sort: Option<SortSpec>,
    /// Requested page size
    pub limit: Option<i64>,
    /// Requested 1-indexed page
    pub page: Option<i64>,
}

impl QueryOptions {
    /// Build options from raw query parameters and a field allow-list
    pub fn from_params(params: &HashMap<String, String>, allowed: &[FilterField]) -> Self {
        // Allow-list order keeps the filter sequence deterministic
        let filters = allowed
            .iter()
            .filter_map(|field| {
                params
                    .get(field.name)
                    .map(|raw| FilterCondition::eq(field.name, field.kind.coerce(raw)))
            })
            .collect();

        let sort = params.get(SORT_PARAM).and_then(|token| SortSpec::parse(token));

        Self {
            filters,
            sort,
            limit: params.get(LIMIT_PARAM).and_then(|raw| parse_count(raw)),
            page: params.get(PAGE_PARAM).and_then(|raw| parse_count(raw)),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterCondition) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    /// Page size; `None` means every matching row
    pub fn page_size(&self) -> Option<i64> {
        self.limit
    }

    /// `(page - 1) * limit`, or zero without a limit
    pub fn page_offset(&self) -> i64 {
        match self.limit {
            Some(limit) => self.page.unwrap_or(1).saturating_sub(1).saturating_mul(limit),
            None => 0,
        }
    }

    /// Store-facing window, clamped
    pub fn pagination(&self) -> Option<Pagination> {
        self.page_size()
            .map(|limit| Pagination::clamped(self.page_offset(), limit))
    }
}

fn parse_count(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|n| *n != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterValue, OrderDirection};

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const ALLOWED: &[FilterField] = &[
        FilterField::text("name"),
        FilterField::integer("rating"),
        FilterField::flag("disabled"),
    ];

    #[test]
    fn test_empty_params() {
        let options = QueryOptions::from_params(&HashMap::new(), ALLOWED);
        assert!(options.filters.is_empty());
        assert!(options.sort.is_none());
        assert_eq!(options.page_size(), None);
        assert_eq!(options.page_offset(), 0);
        assert_eq!(options.pagination(), None);
    }

    #[test]
    fn test_allow_list_filters() {
        let options = QueryOptions::from_params(
            &params(&[("name", "Foo"), ("rating", "4"), ("role", "admin"), ("email", "x")]),
            ALLOWED,
        );
        assert_eq!(
            options.filters,
            vec![
                FilterCondition::eq("name", "Foo"),
                FilterCondition::eq("rating", FilterValue::Integer(4)),
            ]
        );
    }

    #[test]
    fn test_flag_filter_coercion() {
        let options = QueryOptions::from_params(&params(&[("disabled", "true")]), ALLOWED);
        assert_eq!(options.filters, vec![FilterCondition::eq("disabled", true)]);
    }

    #[test]
    fn test_sort() {
        let options = QueryOptions::from_params(&params(&[("sortBy", "name:desc")]), ALLOWED);
        assert_eq!(
            options.sort,
            Some(SortSpec::new("name", OrderDirection::Descending))
        );

        // Unknown sort fields pass through
        let options = QueryOptions::from_params(&params(&[("sortBy", "whatever")]), ALLOWED);
        assert_eq!(
            options.sort,
            Some(SortSpec::new("whatever", OrderDirection::Ascending))
        );

        let options = QueryOptions::from_params(&params(&[("sortBy", ":desc")]), ALLOWED);
        assert!(options.sort.is_none());
    }

    #[test]
    fn test_pagination_values() {
        let options = QueryOptions::from_params(&params(&[("limit", "2"), ("page", "2")]), ALLOWED);
        assert_eq!(options.page_size(), Some(2));
        assert_eq!(options.page_offset(), 2);
        assert_eq!(options.pagination(), Some(Pagination::new(2, 2)));

        let options = QueryOptions::from_params(&params(&[("limit", "10")]), ALLOWED);
        assert_eq!(options.page_offset(), 0);
        assert_eq!(options.pagination(), Some(Pagination::new(0, 10)));
    }

    #[test]
    fn test_unparseable_and_zero_are_absent() {
        let options =
            QueryOptions::from_params(&params(&[("limit", "abc"), ("page", "0")]), ALLOWED);
        assert_eq!(options.limit, None);
        assert_eq!(options.page, None);

        let options = QueryOptions::from_params(&params(&[("limit", "0")]), ALLOWED);
        assert_eq!(options.limit, None);
    }

    #[test]
    fn test_negative_values_are_kept_and_clamped_at_the_store() {
        let options =
            QueryOptions::from_params(&params(&[("limit", "-2"), ("page", "3")]), ALLOWED);
        assert_eq!(options.page_size(), Some(-2));
        assert_eq!(options.page_offset(), -4);
        assert_eq!(options.pagination(), Some(Pagination::new(0, 2)));

        let options =
            QueryOptions::from_params(&params(&[("limit", "5"), ("page", "-1")]), ALLOWED);
        assert_eq!(options.page, Some(-1));
        assert_eq!(options.pagination(), Some(Pagination::new(0, 5)));
    }

    #[test]
    fn test_page_without_limit() {
        let options = QueryOptions::from_params(&params(&[("page", "3")]), ALLOWED);
        assert_eq!(options.page, Some(3));
        assert_eq!(options.pagination(), None);
    }

    #[test]
    fn test_builder_methods() {
        let options = QueryOptions::default()
            .with_filter(FilterCondition::eq("name", "Bar"))
            .with_sort(SortSpec::new("rating", OrderDirection::Descending))
            .with_limit(3)
            .with_page(2);
        assert_eq!(options.page_offset(), 3);
        assert_eq!(options.filters.len(), 1);
    }
}
