use crate::response::ApiResponse;

pub async fn health() -> ApiResponse<()> {
    ApiResponse::message("Your server is up and running ...")
}
