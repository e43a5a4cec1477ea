//! Offset and cursor pagination over a generic list store.
//!
//! Requests arrive as loosely-typed [`ListParams`] and are normalized once
//! into a [`PageWindow`]. [`paginate`] dispatches on the window, so offset
//! and cursor handling never mix inside one request.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::try_join;
use tracing::instrument;

use crate::application::repos::{ListStore, RepoError};
use crate::domain::entities::UserRecord;
use crate::domain::views::{PostView, SavedPostView};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("`{resource}` listings cannot be paged by cursor field `{field}`")]
    UnsupportedCursor {
        resource: &'static str,
        field: &'static str,
    },
}

/// Entity kinds that can be listed through the pagination engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Post,
    SavedPost,
    User,
}

impl Resource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Resource::Post => "post",
            Resource::SavedPost => "savedPost",
            Resource::User => "user",
        }
    }

    /// Fields matched by free-text search.
    pub const fn search_fields(self) -> &'static [SearchField] {
        match self {
            Resource::Post => &[SearchField::Captions],
            Resource::SavedPost => &[],
            Resource::User => &[SearchField::Name, SearchField::Email],
        }
    }

    /// Unique fields a cursor may point at.
    pub const fn cursor_fields(self) -> &'static [CursorField] {
        match self {
            Resource::Post | Resource::SavedPost => &[CursorField::Id],
            Resource::User => &[CursorField::Id, CursorField::Email],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Captions,
    Name,
    Email,
}

impl SearchField {
    pub const fn column(self) -> &'static str {
        match self {
            SearchField::Captions => "captions",
            SearchField::Name => "name",
            SearchField::Email => "email",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CursorField {
    Id,
    Email,
}

impl CursorField {
    pub const fn as_str(self) -> &'static str {
        match self {
            CursorField::Id => "id",
            CursorField::Email => "email",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "id" => Some(CursorField::Id),
            "email" => Some(CursorField::Email),
            _ => None,
        }
    }

    /// Interpret a raw cursor string as a value of this field.
    pub fn parse_value(self, raw: &str) -> Option<CursorValue> {
        let raw = raw.trim();
        match self {
            CursorField::Id => raw
                .parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .map(CursorValue::Int),
            CursorField::Email => (!raw.is_empty()).then(|| CursorValue::Text(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CursorValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for CursorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorValue::Int(value) => write!(f, "{value}"),
            CursorValue::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    CreatedAt,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Ordering applied to a listing. Ties always break on `id` in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Sort {
    pub const NEWEST_FIRST: Sort = Sort {
        key: SortKey::CreatedAt,
        direction: SortDirection::Desc,
    };

    /// Ordering requested through `sortBy`/`order`. Unrecognized values keep
    /// the newest-first default.
    pub fn from_params(params: &ListParams) -> Self {
        let key = match params.sort_by.as_deref().map(str::trim) {
            Some("id") => SortKey::Id,
            _ => SortKey::CreatedAt,
        };
        let direction = match params.order.as_deref().map(str::trim) {
            Some(order) if order.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        };
        Sort { key, direction }
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::NEWEST_FIRST
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            SortKey::CreatedAt => "createdAt",
            SortKey::Id => "id",
        };
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{key}.{direction}")
    }
}

/// Raw listing parameters as they arrive on the query string.
///
/// Numbers stay strings so that malformed input normalizes to defaults
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
    pub cursor_field: Option<String>,
    pub include_total: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetWindow {
    pub page: u32,
    pub limit: u32,
    pub count_total: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CursorWindow {
    pub cursor: CursorValue,
    pub field: CursorField,
    pub limit: u32,
    pub count_total: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageWindow {
    Offset(OffsetWindow),
    Cursor(CursorWindow),
}

impl PageWindow {
    /// Normalize raw parameters for `resource`.
    ///
    /// A usable cursor selects cursor mode. Cursor fields outside the
    /// resource's unique fields fall back to `id`; a cursor that does not
    /// parse for its field is dropped and the request is served by offset.
    pub fn from_params(resource: Resource, params: &ListParams) -> Self {
        let limit = parse_positive(params.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        let count_total = !matches!(
            params.include_total.as_deref().map(str::trim),
            Some("false") | Some("0")
        );

        if let Some(raw_cursor) = params.cursor.as_deref().filter(|c| !c.trim().is_empty()) {
            let field = params
                .cursor_field
                .as_deref()
                .and_then(CursorField::parse)
                .filter(|field| resource.cursor_fields().contains(field))
                .unwrap_or(CursorField::Id);

            if let Some(cursor) = field.parse_value(raw_cursor) {
                return PageWindow::Cursor(CursorWindow {
                    cursor,
                    field,
                    limit,
                    count_total,
                });
            }
        }

        PageWindow::Offset(OffsetWindow {
            page: parse_positive(params.page.as_deref()).unwrap_or(DEFAULT_PAGE),
            limit,
            count_total,
        })
    }

    pub fn limit(&self) -> u32 {
        match self {
            PageWindow::Offset(window) => window.limit,
            PageWindow::Cursor(window) => window.limit,
        }
    }

    pub fn counts_total(&self) -> bool {
        match self {
            PageWindow::Offset(window) => window.count_total,
            PageWindow::Cursor(window) => window.count_total,
        }
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        PageWindow::Offset(OffsetWindow {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            count_total: true,
        })
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw?.trim()
        .parse::<i64>()
        .ok()
        .filter(|value| *value > 0)
        .map(|value| u32::try_from(value).unwrap_or(u32::MAX))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub fields: &'static [SearchField],
    pub term: String,
}

/// Structural filter plus optional free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub search: Option<SearchFilter>,
    pub owner_id: Option<i64>,
}

impl ListFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn owned_by(owner_id: i64) -> Self {
        Self {
            search: None,
            owner_id: Some(owner_id),
        }
    }

    /// Case-insensitive "contains" over the resource's searchable fields,
    /// combined with the structural filter. Blank terms leave the filter as is.
    pub fn with_search(mut self, resource: Resource, term: Option<&str>) -> Self {
        let fields = resource.search_fields();
        if let Some(term) = term.map(str::trim).filter(|term| !term.is_empty()) {
            if !fields.is_empty() {
                self.search = Some(SearchFilter {
                    fields,
                    term: term.to_string(),
                });
            }
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorBound {
    pub field: CursorField,
    pub value: CursorValue,
}

/// What a [`ListStore`] is asked to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: ListFilter,
    pub sort: Sort,
    pub skip: u64,
    /// Rows strictly after the row whose field equals this value.
    pub after: Option<CursorBound>,
    pub take: u32,
}

/// Items that can report the value of a cursor field.
pub trait Cursorable {
    fn cursor_value(&self, field: CursorField) -> Option<CursorValue>;
}

impl Cursorable for PostView {
    fn cursor_value(&self, field: CursorField) -> Option<CursorValue> {
        match field {
            CursorField::Id => Some(CursorValue::Int(self.id)),
            CursorField::Email => None,
        }
    }
}

impl Cursorable for SavedPostView {
    fn cursor_value(&self, field: CursorField) -> Option<CursorValue> {
        match field {
            CursorField::Id => Some(CursorValue::Int(self.id)),
            CursorField::Email => None,
        }
    }
}

impl Cursorable for UserRecord {
    fn cursor_value(&self, field: CursorField) -> Option<CursorValue> {
        match field {
            CursorField::Id => Some(CursorValue::Int(self.id)),
            CursorField::Email => Some(CursorValue::Text(self.email.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetPageInfo {
    pub page: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_next_page: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_previous_page: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPageInfo {
    pub limit: u32,
    pub cursor: CursorValue,
    pub next_cursor: Option<CursorValue>,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PageInfo {
    Offset(OffsetPageInfo),
    Cursor(CursorPageInfo),
}

/// Normalized listing envelope shared by every list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

/// Fetch one page of `resource` from `store` according to `window`.
///
/// A cursor window on a field the resource cannot be keyed by is a wiring
/// error and fails before the store is queried.
#[instrument(level = "debug", skip_all, fields(resource = resource.as_str(), sort = %sort))]
pub async fn paginate<T, S>(
    store: &S,
    resource: Resource,
    filter: ListFilter,
    sort: Sort,
    window: &PageWindow,
) -> Result<ListResult<T>, RepoError>
where
    T: Cursorable + Send,
    S: ListStore<T> + ?Sized,
{
    if let PageWindow::Cursor(cursor) = window {
        if !resource.cursor_fields().contains(&cursor.field) {
            return Err(PaginationError::UnsupportedCursor {
                resource: resource.as_str(),
                field: cursor.field.as_str(),
            }
            .into());
        }
    }

    match window {
        PageWindow::Offset(window) => paginate_offset(store, filter, sort, window).await,
        PageWindow::Cursor(window) => paginate_cursor(store, filter, sort, window).await,
    }
}

async fn paginate_offset<T, S>(
    store: &S,
    filter: ListFilter,
    sort: Sort,
    window: &OffsetWindow,
) -> Result<ListResult<T>, RepoError>
where
    T: Cursorable + Send,
    S: ListStore<T> + ?Sized,
{
    let query = ListQuery {
        filter,
        sort,
        skip: u64::from(window.page.saturating_sub(1)) * u64::from(window.limit),
        after: None,
        take: window.limit,
    };

    let (items, total) = try_join!(
        store.find_many(&query),
        count_if::<T, S>(store, &query.filter, window.count_total)
    )?;

    let pagination = match total {
        Some(total) => {
            let total_pages = total.div_ceil(u64::from(window.limit));
            OffsetPageInfo {
                page: window.page,
                limit: window.limit,
                total: Some(total),
                total_pages: Some(total_pages),
                has_next_page: Some(u64::from(window.page) < total_pages),
                has_previous_page: Some(window.page > 1),
            }
        }
        None => OffsetPageInfo {
            page: window.page,
            limit: window.limit,
            total: None,
            total_pages: None,
            has_next_page: None,
            has_previous_page: None,
        },
    };

    Ok(ListResult {
        items,
        pagination: PageInfo::Offset(pagination),
    })
}

async fn paginate_cursor<T, S>(
    store: &S,
    filter: ListFilter,
    sort: Sort,
    window: &CursorWindow,
) -> Result<ListResult<T>, RepoError>
where
    T: Cursorable + Send,
    S: ListStore<T> + ?Sized,
{
    let query = ListQuery {
        filter,
        sort,
        skip: 0,
        after: Some(CursorBound {
            field: window.field,
            value: window.cursor.clone(),
        }),
        take: window.limit + 1,
    };

    let (mut items, total) = try_join!(
        store.find_many(&query),
        count_if::<T, S>(store, &query.filter, window.count_total)
    )?;

    let limit = window.limit as usize;
    let has_more = items.len() > limit;
    if has_more {
        items.truncate(limit);
    }
    let next_cursor = if has_more {
        items.last().and_then(|item| item.cursor_value(window.field))
    } else {
        None
    };

    Ok(ListResult {
        items,
        pagination: PageInfo::Cursor(CursorPageInfo {
            limit: window.limit,
            cursor: window.cursor.clone(),
            next_cursor,
            has_more,
            total,
        }),
    })
}

async fn count_if<T, S>(
    store: &S,
    filter: &ListFilter,
    enabled: bool,
) -> Result<Option<u64>, RepoError>
where
    T: Send,
    S: ListStore<T> + ?Sized,
{
    if enabled {
        store.count(filter).await.map(Some)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: i64,
        owner: i64,
    }

    impl Cursorable for Item {
        fn cursor_value(&self, field: CursorField) -> Option<CursorValue> {
            match field {
                CursorField::Id => Some(CursorValue::Int(self.id)),
                CursorField::Email => None,
            }
        }
    }

    /// Items are kept newest (highest id) first.
    struct VecStore {
        items: Vec<Item>,
    }

    impl VecStore {
        fn with_ids(count: i64) -> Self {
            Self {
                items: (1..=count)
                    .rev()
                    .map(|id| Item { id, owner: id % 2 })
                    .collect(),
            }
        }

        fn matching(&self, filter: &ListFilter) -> Vec<Item> {
            self.items
                .iter()
                .filter(|item| filter.owner_id.is_none_or(|owner| item.owner == owner))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl ListStore<Item> for VecStore {
        async fn find_many(&self, query: &ListQuery) -> Result<Vec<Item>, RepoError> {
            let rows = self.matching(&query.filter);
            let start = match &query.after {
                Some(bound) => match rows
                    .iter()
                    .position(|item| item.cursor_value(bound.field).as_ref() == Some(&bound.value))
                {
                    Some(position) => position + 1,
                    None => return Ok(Vec::new()),
                },
                None => 0,
            };
            Ok(rows
                .into_iter()
                .skip(start + query.skip as usize)
                .take(query.take as usize)
                .collect())
        }

        async fn count(&self, filter: &ListFilter) -> Result<u64, RepoError> {
            Ok(self.matching(filter).len() as u64)
        }
    }

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let mut params = ListParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "page" => params.page = value,
                "limit" => params.limit = value,
                "cursor" => params.cursor = value,
                "cursorField" => params.cursor_field = value,
                "includeTotal" => params.include_total = value,
                "search" => params.search = value,
                "sortBy" => params.sort_by = value,
                "order" => params.order = value,
                other => panic!("unknown param {other}"),
            }
        }
        params
    }

    #[test]
    fn missing_params_use_defaults() {
        let window = PageWindow::from_params(Resource::Post, &ListParams::default());
        assert_eq!(window, PageWindow::default());
    }

    #[test]
    fn malformed_numbers_normalize_to_defaults() {
        let window = PageWindow::from_params(
            Resource::Post,
            &params(&[("page", "abc"), ("limit", "-5")]),
        );
        assert_eq!(
            window,
            PageWindow::Offset(OffsetWindow {
                page: 1,
                limit: 10,
                count_total: true
            })
        );

        let window = PageWindow::from_params(Resource::Post, &params(&[("page", "0")]));
        assert!(matches!(window, PageWindow::Offset(OffsetWindow { page: 1, .. })));
    }

    #[test]
    fn limit_is_clamped() {
        let window = PageWindow::from_params(Resource::Post, &params(&[("limit", "5000")]));
        assert_eq!(window.limit(), MAX_LIMIT);
    }

    #[test]
    fn cursor_selects_cursor_mode() {
        let window = PageWindow::from_params(
            Resource::Post,
            &params(&[("cursor", "15"), ("page", "4"), ("limit", "5")]),
        );
        assert_eq!(
            window,
            PageWindow::Cursor(CursorWindow {
                cursor: CursorValue::Int(15),
                field: CursorField::Id,
                limit: 5,
                count_total: true,
            })
        );
    }

    #[test]
    fn unparseable_cursor_falls_back_to_offset() {
        let window = PageWindow::from_params(
            Resource::Post,
            &params(&[("cursor", "not-a-number"), ("page", "2")]),
        );
        assert!(matches!(window, PageWindow::Offset(OffsetWindow { page: 2, .. })));
    }

    #[test]
    fn cursor_field_outside_resource_falls_back_to_id() {
        let window = PageWindow::from_params(
            Resource::Post,
            &params(&[("cursor", "7"), ("cursorField", "email")]),
        );
        assert!(matches!(
            window,
            PageWindow::Cursor(CursorWindow {
                field: CursorField::Id,
                ..
            })
        ));

        let window = PageWindow::from_params(
            Resource::User,
            &params(&[("cursor", "a@example.com"), ("cursorField", "email")]),
        );
        assert!(matches!(
            window,
            PageWindow::Cursor(CursorWindow {
                field: CursorField::Email,
                cursor: CursorValue::Text(_),
                ..
            })
        ));
    }

    #[test]
    fn include_total_can_be_disabled() {
        let window = PageWindow::from_params(Resource::Post, &params(&[("includeTotal", "false")]));
        assert!(!window.counts_total());
    }

    #[test]
    fn search_combines_with_owner_filter() {
        let filter = ListFilter::owned_by(3).with_search(Resource::Post, Some("  rust "));
        assert_eq!(filter.owner_id, Some(3));
        let search = filter.search.expect("search applied");
        assert_eq!(search.term, "rust");
        assert_eq!(search.fields, &[SearchField::Captions]);

        let blank = ListFilter::owned_by(3).with_search(Resource::Post, Some("   "));
        assert_eq!(blank, ListFilter::owned_by(3));

        let users = ListFilter::all().with_search(Resource::User, Some("ann"));
        assert_eq!(
            users.search.map(|s| s.fields),
            Some(&[SearchField::Name, SearchField::Email][..])
        );
    }

    #[test]
    fn sort_params_select_ordering() {
        assert_eq!(Sort::from_params(&ListParams::default()), Sort::NEWEST_FIRST);
        assert_eq!(
            Sort::from_params(&params(&[("sortBy", "id"), ("order", "ASC")])),
            Sort {
                key: SortKey::Id,
                direction: SortDirection::Asc,
            }
        );
        assert_eq!(
            Sort::from_params(&params(&[("sortBy", "captions"), ("order", "sideways")])),
            Sort::NEWEST_FIRST
        );
    }

    #[tokio::test]
    async fn cursor_field_foreign_to_resource_fails_fast() {
        let store = VecStore::with_ids(3);
        let window = PageWindow::Cursor(CursorWindow {
            cursor: CursorValue::Text("a@example.com".into()),
            field: CursorField::Email,
            limit: 5,
            count_total: false,
        });

        let err = paginate::<Item, _>(
            &store,
            Resource::Post,
            ListFilter::all(),
            Sort::NEWEST_FIRST,
            &window,
        )
        .await
        .expect_err("email cursors are not valid for posts");

        assert!(matches!(
            err,
            RepoError::Pagination(PaginationError::UnsupportedCursor {
                resource: "post",
                field: "email"
            })
        ));
    }

    #[tokio::test]
    async fn offset_page_reports_totals() {
        let store = VecStore::with_ids(25);
        let window = PageWindow::from_params(
            Resource::Post,
            &params(&[("page", "3"), ("limit", "10")]),
        );

        let result: ListResult<Item> =
            paginate(&store, Resource::Post, ListFilter::all(), Sort::NEWEST_FIRST, &window)
                .await
                .expect("page");

        assert_eq!(result.items.len(), 5);
        assert_eq!(result.items[0].id, 5);
        assert_eq!(
            result.pagination,
            PageInfo::Offset(OffsetPageInfo {
                page: 3,
                limit: 10,
                total: Some(25),
                total_pages: Some(3),
                has_next_page: Some(false),
                has_previous_page: Some(true),
            })
        );
    }

    #[tokio::test]
    async fn offset_page_without_total_omits_counts() {
        let store = VecStore::with_ids(4);
        let window =
            PageWindow::from_params(Resource::Post, &params(&[("includeTotal", "false")]));

        let result: ListResult<Item> =
            paginate(&store, Resource::Post, ListFilter::all(), Sort::NEWEST_FIRST, &window)
                .await
                .expect("page");

        let json = serde_json::to_value(&result.pagination).expect("json");
        assert_eq!(json, serde_json::json!({"type": "offset", "page": 1, "limit": 10}));
    }

    #[tokio::test]
    async fn cursor_pages_continue_after_cursor_row() {
        let store = VecStore::with_ids(30);
        let window = PageWindow::from_params(
            Resource::Post,
            &params(&[("cursor", "15"), ("limit", "5")]),
        );

        let result: ListResult<Item> =
            paginate(&store, Resource::Post, ListFilter::all(), Sort::NEWEST_FIRST, &window)
                .await
                .expect("page");

        let ids: Vec<i64> = result.items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![14, 13, 12, 11, 10]);
        match result.pagination {
            PageInfo::Cursor(info) => {
                assert!(info.has_more);
                assert_eq!(info.next_cursor, Some(CursorValue::Int(10)));
                assert_eq!(info.cursor, CursorValue::Int(15));
                assert_eq!(info.total, Some(30));
            }
            other => panic!("expected cursor page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn last_cursor_page_has_no_next_cursor() {
        let store = VecStore::with_ids(6);
        let window = PageWindow::from_params(
            Resource::Post,
            &params(&[("cursor", "3"), ("limit", "5")]),
        );

        let result: ListResult<Item> =
            paginate(&store, Resource::Post, ListFilter::all(), Sort::NEWEST_FIRST, &window)
                .await
                .expect("page");

        assert_eq!(result.items.len(), 2);
        let json = serde_json::to_value(&result.pagination).expect("json");
        assert_eq!(json["type"], "cursor");
        assert_eq!(json["hasMore"], false);
        assert!(json["nextCursor"].is_null());
    }

    #[tokio::test]
    async fn unknown_cursor_row_yields_empty_page() {
        let store = VecStore::with_ids(6);
        let window = PageWindow::from_params(Resource::Post, &params(&[("cursor", "999")]));

        let result: ListResult<Item> =
            paginate(&store, Resource::Post, ListFilter::all(), Sort::NEWEST_FIRST, &window)
                .await
                .expect("page");

        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn owner_filter_limits_rows_and_totals() {
        let store = VecStore::with_ids(10);
        let result: ListResult<Item> = paginate(
            &store,
            Resource::Post,
            ListFilter::owned_by(1),
            Sort::NEWEST_FIRST,
            &PageWindow::default(),
        )
        .await
        .expect("page");

        assert!(result.items.iter().all(|item| item.owner == 1));
        assert!(matches!(
            result.pagination,
            PageInfo::Offset(OffsetPageInfo { total: Some(5), .. })
        ));
    }

    #[test]
    fn list_result_round_trips_through_json() {
        let result = ListResult {
            items: vec![1, 2],
            pagination: PageInfo::Cursor(CursorPageInfo {
                limit: 2,
                cursor: CursorValue::Text("a@example.com".into()),
                next_cursor: Some(CursorValue::Int(9)),
                has_more: true,
                total: None,
            }),
        };
        let text = serde_json::to_string(&result).expect("serialize");
        let decoded: ListResult<i32> = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(decoded, result);
    }
}
