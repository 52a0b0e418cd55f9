//! Common DTO types: the response envelope and list queries

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use stockroom_db::{ListParams, Page, SortOrder};
use utoipa::{IntoParams, ToSchema};

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Outcome class carried in every envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    /// Client error (4xx)
    Error,
    /// Server error (5xx)
    Fail,
}

impl ResponseStatus {
    pub fn for_status(status: StatusCode) -> Self {
        if status.is_server_error() {
            Self::Fail
        } else if status.is_client_error() {
            Self::Error
        } else {
            Self::Success
        }
    }
}

/// One field-level problem in a rejected request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Page position returned with list results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub has_next_page: bool,
    pub next_page: Option<u32>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl Pagination {
    pub fn new(current_page: u32, limit: u32, total_items: u64) -> Self {
        let limit = u64::from(limit.max(1));
        let total_pages = u32::try_from(total_items.div_ceil(limit)).unwrap_or(u32::MAX);
        let has_next_page = current_page < total_pages;

        Self {
            has_next_page,
            next_page: has_next_page.then(|| current_page + 1),
            current_page,
            total_pages,
            total_items,
        }
    }
}

/// Data, pagination and errors of an envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload<T> {
    pub data: Option<T>,
    pub pagination: Option<Pagination>,
    pub errors: Vec<FieldError>,
}

/// Standard response body for every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: ResponseStatus,
    pub status_code: u16,
    pub message: String,
    pub payload: Payload<T>,
}

impl<T> Envelope<T> {
    /// Successful response carrying `data`
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::for_status(status),
            status_code: status.as_u16(),
            message: message.into(),
            payload: Payload {
                data: Some(data),
                pagination: None,
                errors: Vec::new(),
            },
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.payload.pagination = Some(pagination);
        self
    }
}

impl Envelope<()> {
    /// Error response with no data
    pub fn error(status: StatusCode, message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            status: ResponseStatus::for_status(status),
            status_code: status.as_u16(),
            message: message.into(),
            payload: Payload {
                data: None,
                pagination: None,
                errors,
            },
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Envelope for a page of list results
pub fn paged<T, U>(message: &str, page: Page<T>, query: &ListQuery) -> Envelope<Vec<U>>
where
    U: From<T>,
{
    let params = query.to_params();
    let total = u64::try_from(page.total).unwrap_or(0);
    let items = page.items.into_iter().map(U::from).collect();

    Envelope::success(StatusCode::OK, message, items)
        .with_pagination(Pagination::new(params.page, params.limit, total))
}

/// List query parameters shared by every collection endpoint
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page number (1-indexed, default 1)
    pub page: Option<u32>,
    /// Items per page (default 10, max 100)
    pub limit: Option<u32>,
    /// Case-insensitive text filter
    pub search: Option<String>,
    /// Column to sort by (default `created_at`)
    pub sort_by: Option<String>,
    /// `asc` (default) or `desc`
    #[param(value_type = Option<String>)]
    pub order: Option<SortOrder>,
}

impl ListQuery {
    /// Apply defaults and clamp to the allowed range
    pub fn to_params(&self) -> ListParams {
        ListParams {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(10).clamp(1, MAX_PAGE_SIZE),
            search: self.search.clone(),
            sort_by: self.sort_by.clone(),
            order: self.order.unwrap_or_default(),
        }
    }
}
