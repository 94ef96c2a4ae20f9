use kmeans_lab::app;
use kmeans_lab::error::ServiceError;

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    app::run().await
}
