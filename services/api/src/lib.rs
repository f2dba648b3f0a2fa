mod cli;
mod demo;
mod directory;
mod infra;
mod routes;
mod server;

use domestic_connect::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
