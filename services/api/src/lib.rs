mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use suivi_conducteurs::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
