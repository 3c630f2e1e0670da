use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(beacon_users_migration::Migrator).await;
}
