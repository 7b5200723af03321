pub mod routes;
pub mod state;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::infrastructure::NotifyError;

pub use routes::create_router;
pub use state::AppState;

/// 错误到 HTTP 状态码的映射
///
/// 验证 -> 400，未找到 -> 404，其余 (配置/渲染/投递/中断/序列化/存储)
/// 都属于服务端故障。
impl IntoResponse for NotifyError {
    fn into_response(self) -> Response {
        let status = match &self {
            NotifyError::Validation { .. } => StatusCode::BAD_REQUEST,
            NotifyError::NotFound { .. } => StatusCode::NOT_FOUND,
            NotifyError::Configuration { .. }
            | NotifyError::Render { .. }
            | NotifyError::DeliverySend { .. }
            | NotifyError::Interrupted { .. }
            | NotifyError::Serialization { .. }
            | NotifyError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
