use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::config::IgtConfig;

/// Opens an embedded in-memory database scoped to the configured namespace.
pub async fn connect_memory(config: &IgtConfig) -> Result<Surreal<Db>, surrealdb::Error> {
    let db = Surreal::new::<Mem>(()).await?;
    db.use_ns(&config.db_namespace)
        .use_db(&config.db_name)
        .await?;
    info!(namespace = %config.db_namespace, database = %config.db_name, "using in-memory database");
    Ok(db)
}

/// Connects to a remote database over websockets, signing in as root when
/// credentials are configured.
pub async fn connect_remote(config: &IgtConfig, uri: &str) -> Result<Surreal<Client>, surrealdb::Error> {
    let db = Surreal::new::<Ws>(uri).await?;

    if let (Some(username), Some(password)) =
        (config.db_username.as_ref(), config.db_password.as_ref())
    {
        db.signin(Root {
            username: username.clone(),
            password: password.clone(),
        })
        .await?;
    }

    db.use_ns(&config.db_namespace)
        .use_db(&config.db_name)
        .await?;
    info!(uri, namespace = %config.db_namespace, database = %config.db_name, "connected to database");
    Ok(db)
}
