use async_trait::async_trait;
use button_events_core::config::WarehouseConfig;
use tokio_postgres::NoTls;
use tracing::warn;

use crate::adapters::secrets::WarehouseCredential;

/// Capability seam over the warehouse. The handler only ever hands it a fully
/// rendered statement.
#[async_trait]
pub trait WarehouseLoader: Send + Sync {
    async fn execute(&self, statement: &str) -> Result<(), String>;
}

/// `WarehouseLoader` backed by a Redshift cluster, which speaks the postgres
/// wire protocol. A fresh connection per invocation keeps the Lambda free of
/// pooled state between cold starts.
pub struct RedshiftLoader {
    config: WarehouseConfig,
    credential: WarehouseCredential,
}

impl RedshiftLoader {
    pub fn new(config: WarehouseConfig, credential: WarehouseCredential) -> Self {
        Self { config, credential }
    }

    fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={} connect_timeout=15",
            self.config.host,
            self.config.port,
            self.config.database,
            self.config.user,
            self.credential.reveal(),
        )
    }
}

#[async_trait]
impl WarehouseLoader for RedshiftLoader {
    async fn execute(&self, statement: &str) -> Result<(), String> {
        let (client, connection) = tokio_postgres::connect(&self.connection_string(), NoTls)
            .await
            .map_err(|error| format!("failed to connect to warehouse: {error}"))?;

        let driver = tokio::spawn(async move {
            if let Err(error) = connection.await {
                warn!("warehouse connection closed with error: {error}");
            }
        });

        let result = client
            .batch_execute(statement)
            .await
            .map_err(|error| format!("failed to execute insert statement: {error}"));

        drop(client);
        let _ = driver.await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_string_carries_every_setting() {
        let loader = RedshiftLoader::new(
            WarehouseConfig {
                host: "cluster.example.internal".to_string(),
                port: 5439,
                database: "events".to_string(),
                table_name: "button_clicks".to_string(),
                user: "loader".to_string(),
            },
            WarehouseCredential::new("hunter2"),
        );

        assert_eq!(
            loader.connection_string(),
            "host=cluster.example.internal port=5439 dbname=events user=loader \
             password=hunter2 connect_timeout=15"
        );
    }
}
