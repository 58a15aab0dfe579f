use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: usize = 6;

/// Uniform success envelope; errors use the mirror shape in `error.rs`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    pub success: bool,
    pub error: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            pagination: None,
            success: true,
            error: false,
        }
    }

    pub fn paged(message: impl Into<String>, data: T, pagination: Pagination) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            pagination: Some(pagination),
            success: true,
            error: false,
        }
    }
}

/// Bare acknowledgement without a data payload
pub fn ack(message: impl Into<String>) -> ApiResponse<()> {
    ApiResponse {
        message: message.into(),
        data: None,
        pagination: None,
        success: true,
        error: false,
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl PageQuery {
    pub fn page(&self) -> usize {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> usize {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// Slice one page out of an already-filtered result set
pub fn paginate<T: Clone>(items: &[T], page: usize, limit: usize) -> (Vec<T>, Pagination) {
    let total_items = items.len();
    let total_pages = total_items.div_ceil(limit);
    let start = (page - 1).saturating_mul(limit);
    let slice = items
        .iter()
        .skip(start)
        .take(limit)
        .cloned()
        .collect();
    (
        slice,
        Pagination {
            current_page: page,
            total_pages,
            total_items,
        },
    )
}
