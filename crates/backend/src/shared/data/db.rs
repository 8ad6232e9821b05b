use std::path::Path;

use sea_orm::sea_query::{Alias, ColumnDef, Index, Table};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};

use crate::shared::relations::{EntityDef, EntityRegistry, FieldKind, RelationLink};

fn sqlite_url(db_file: &Path) -> anyhow::Result<String> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    Ok(format!("sqlite://{}{}?mode=rwc", prefix, normalized))
}

/// Открывает файл БД и создаёт недостающие таблицы каталога
pub async fn initialize_database(
    db_file: &Path,
    registry: &EntityRegistry,
) -> anyhow::Result<DatabaseConnection> {
    let db_url = sqlite_url(db_file)?;
    let mut options = ConnectOptions::new(db_url);
    options.sqlx_logging(false);
    let conn = Database::connect(options).await?;
    bootstrap_schema(&conn, registry).await?;
    Ok(conn)
}

/// In-memory база на одном соединении (тесты)
pub async fn connect_in_memory(registry: &EntityRegistry) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;
    bootstrap_schema(&conn, registry).await?;
    Ok(conn)
}

fn column_def(name: &str, kind: FieldKind) -> ColumnDef {
    let mut column = ColumnDef::new(Alias::new(name));
    match kind {
        FieldKind::Text | FieldKind::Timestamp => column.text(),
        FieldKind::Integer => column.big_integer(),
        FieldKind::Decimal => column.double(),
        FieldKind::Boolean => column.boolean(),
    };
    column
}

async fn create_table(conn: &DatabaseConnection, entity: &EntityDef) -> anyhow::Result<()> {
    let backend = conn.get_database_backend();

    let mut table = Table::create();
    table.table(Alias::new(entity.table.as_str())).if_not_exists();
    for field in &entity.fields {
        let mut column = column_def(&field.column, field.kind);
        if field.name == "id" {
            column.not_null().primary_key();
        }
        table.col(&mut column);
    }
    conn.execute(backend.build(&table)).await?;

    // Индексы по ключам связей belongs_to
    for relation in &entity.relations {
        let RelationLink::BelongsTo { local } = &relation.link else {
            continue;
        };
        let Some(field) = entity.find_field(local) else {
            continue;
        };
        let index = Index::create()
            .if_not_exists()
            .name(format!("idx_{}_{}", entity.table, field.column))
            .table(Alias::new(entity.table.as_str()))
            .col(Alias::new(field.column.as_str()))
            .to_owned();
        conn.execute(backend.build(&index)).await?;
    }
    Ok(())
}

/// CREATE TABLE IF NOT EXISTS для каждой сущности реестра
pub async fn bootstrap_schema(
    conn: &DatabaseConnection,
    registry: &EntityRegistry,
) -> anyhow::Result<()> {
    for entity in registry.entities() {
        create_table(conn, entity).await?;
    }
    tracing::info!("Schema ready: {} tables", registry.entities().count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, Statement};

    #[test]
    fn test_sqlite_url_for_relative_path() {
        let dir = std::env::temp_dir().join("erp_db_url_test");
        let url = sqlite_url(&dir.join("erp.db")).unwrap();
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with("erp.db?mode=rwc"));
    }

    #[tokio::test]
    async fn test_bootstrap_creates_every_table() {
        let registry = EntityRegistry::from_catalog();
        let conn = connect_in_memory(&registry).await.unwrap();
        // Повторный запуск не падает
        bootstrap_schema(&conn, &registry).await.unwrap();

        let rows = conn
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type='table'".to_string(),
            ))
            .await
            .unwrap();
        let names: Vec<String> = rows
            .iter()
            .map(|r| r.try_get::<String>("", "name").unwrap())
            .collect();
        for entity in registry.entities() {
            assert!(names.contains(&entity.table), "missing {}", entity.table);
        }
    }
}
