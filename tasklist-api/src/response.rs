//! The uniform response envelope.
//!
//! Every endpoint responds with `{ success, data?, message? }`; list
//! endpoints add `count`, `totalCount`, `totalPages`, `currentPage`.
//! Error responses use the same shape with `success: false` and are
//! produced by [`crate::error::ApiError`].

use axum::Json;
use serde::Serialize;

/// Standard success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Envelope carrying only data.
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    /// Envelope carrying data and a human-readable message.
    pub fn data_with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        })
    }
}

impl ApiResponse<()> {
    /// Envelope carrying only a message (deletes, password changes).
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: Some(message.into()),
        })
    }
}

/// List envelope with pagination metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub total_count: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub data: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    /// Builds the envelope for one page of results.
    ///
    /// `total_pages` is the ceiling of `total_count / limit`; an empty
    /// result set has zero pages.
    pub fn new(data: Vec<T>, total_count: i64, page: i64, limit: i64) -> Json<Self> {
        let total_pages = if limit > 0 {
            (total_count + limit - 1) / limit
        } else {
            0
        };

        Json(Self {
            success: true,
            count: data.len(),
            total_count,
            total_pages,
            current_page: page,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_envelope_shape() {
        let Json(envelope) = ApiResponse::data(serde_json::json!({"id": 1}));
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_message_envelope_shape() {
        let Json(envelope) = ApiResponse::message("Todo deleted successfully");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Todo deleted successfully");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_list_envelope_pagination_math() {
        // 12 items at limit 5: page 2 carries 5 rows, 3 pages total.
        let rows: Vec<i32> = vec![6, 7, 8, 9, 10];
        let Json(envelope) = ListResponse::new(rows, 12, 2, 5);

        assert_eq!(envelope.count, 5);
        assert_eq!(envelope.total_count, 12);
        assert_eq!(envelope.total_pages, 3);
        assert_eq!(envelope.current_page, 2);
    }

    #[test]
    fn test_list_envelope_empty() {
        let Json(envelope) = ListResponse::<i32>::new(vec![], 0, 1, 10);

        assert_eq!(envelope.count, 0);
        assert_eq!(envelope.total_count, 0);
        assert_eq!(envelope.total_pages, 0);
        assert_eq!(envelope.current_page, 1);
    }

    #[test]
    fn test_list_envelope_camel_case_keys() {
        let Json(envelope) = ListResponse::<i32>::new(vec![1], 1, 1, 10);
        let json = serde_json::to_value(&envelope).unwrap();

        assert!(json.get("totalCount").is_some());
        assert!(json.get("totalPages").is_some());
        assert!(json.get("currentPage").is_some());
    }
}
