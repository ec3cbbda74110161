// connexion BD

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    // Pas de log SQL par requête, les erreurs remontent via DbErr
    options.sqlx_logging(false);

    Database::connect(options).await
}
