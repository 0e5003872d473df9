use axum::Json;

use crate::api::middleware::CurrentUser;

/// Module index; a plain message serialized as JSON
///
/// GET /v1/apis
pub async fn index(CurrentUser(_user): CurrentUser) -> Json<&'static str> {
    Json("Module controller")
}
