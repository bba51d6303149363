// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Storage Backend
//!
//! One `vfs_files` row per (project_id, path), enforced by a unique
//! constraint. Writes are `INSERT .. ON CONFLICT DO UPDATE` upserts that bump
//! `version`; the version is bookkeeping only and never checked.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Persist VFS records in PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::file::{FileInfo, ScopeId, VFile};
use crate::domain::path_validator::child_prefix;
use crate::domain::storage::{DeleteOptions, StorageBackend, StorageError};

const UPSERT_CONFLICT_CLAUSE: &str = r#"
    ON CONFLICT (project_id, path) DO UPDATE SET
        content = EXCLUDED.content,
        content_type = EXCLUDED.content_type,
        metadata = EXCLUDED.metadata,
        description = COALESCE(EXCLUDED.description, vfs_files.description),
        updated_at = NOW(),
        version = vfs_files.version + 1
"#;

pub struct PostgresStorageBackend {
    pool: PgPool,
}

impl PostgresStorageBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StorageBackend for PostgresStorageBackend {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn read(&self, scope: &ScopeId, path: &str) -> Result<Option<VFile>, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT path, content, content_type, description, metadata, updated_at
            FROM vfs_files
            WHERE project_id = $1 AND path = $2
            "#,
        )
        .bind(scope.as_str())
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::failed(path, e))?;

        match row {
            Some(row) => Ok(Some(parse_file_row(&row).map_err(|e| StorageError::failed(path, e))?.0)),
            None => Ok(None),
        }
    }

    async fn write(&self, scope: &ScopeId, file: VFile) -> Result<(), StorageError> {
        let sql = format!(
            r#"
            INSERT INTO vfs_files (id, project_id, path, description, content_type, content, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            {}
            "#,
            UPSERT_CONFLICT_CLAUSE
        );

        sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(scope.as_str())
            .bind(&file.path)
            .bind(&file.description)
            .bind(&file.content_type)
            .bind(&file.content)
            .bind(file.metadata.clone().map(serde_json::Value::Object))
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::failed(&file.path, e))?;

        Ok(())
    }

    async fn delete(&self, scope: &ScopeId, path: &str, options: DeleteOptions) -> Result<(), StorageError> {
        let result = if options.recursive {
            sqlx::query(
                r#"
                DELETE FROM vfs_files
                WHERE project_id = $1 AND (path = $2 OR path LIKE $3 ESCAPE '\')
                "#,
            )
            .bind(scope.as_str())
            .bind(path)
            .bind(descendant_pattern(path))
            .execute(&self.pool)
            .await
        } else {
            sqlx::query("DELETE FROM vfs_files WHERE project_id = $1 AND path = $2")
                .bind(scope.as_str())
                .bind(path)
                .execute(&self.pool)
                .await
        };
        let result = result.map_err(|e| StorageError::failed(path, e))?;

        tracing::debug!(
            scope = %scope,
            path = %path,
            recursive = options.recursive,
            removed = result.rows_affected(),
            "Deleted file records"
        );
        Ok(())
    }

    async fn list(&self, scope: &ScopeId) -> Result<Vec<FileInfo>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT path, content, content_type, description, metadata, updated_at
            FROM vfs_files
            WHERE project_id = $1
            ORDER BY path COLLATE "C" ASC
            "#,
        )
        .bind(scope.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::failed("/", e))?;

        let mut files = Vec::with_capacity(rows.len());
        for row in rows {
            let (file, updated_at) = parse_file_row(&row).map_err(|e| StorageError::failed("/", e))?;
            files.push(FileInfo::from_file(&file, updated_at));
        }
        Ok(files)
    }

    async fn move_file(&self, scope: &ScopeId, from: &str, to: &str) -> Result<(), StorageError> {
        if from == to {
            return self.ensure_exists(scope, from).await;
        }

        let mut tx = self.pool.begin().await.map_err(|e| StorageError::failed(from, e))?;

        sqlx::query("DELETE FROM vfs_files WHERE project_id = $1 AND path = $2")
            .bind(scope.as_str())
            .bind(to)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::failed(to, e))?;

        let result = sqlx::query(
            r#"
            UPDATE vfs_files
            SET path = $3, updated_at = NOW(), version = version + 1
            WHERE project_id = $1 AND path = $2
            "#,
        )
        .bind(scope.as_str())
        .bind(from)
        .bind(to)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::failed(from, e))?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the destination delete
            return Err(StorageError::NotFound { path: from.to_string() });
        }

        tx.commit().await.map_err(|e| StorageError::failed(from, e))?;
        Ok(())
    }

    async fn copy_file(&self, scope: &ScopeId, from: &str, to: &str) -> Result<(), StorageError> {
        if from == to {
            return self.ensure_exists(scope, from).await;
        }

        let sql = format!(
            r#"
            INSERT INTO vfs_files (id, project_id, path, description, content_type, content, metadata)
            SELECT $4, project_id, $3, description, content_type, content, metadata
            FROM vfs_files
            WHERE project_id = $1 AND path = $2
            {}
            "#,
            UPSERT_CONFLICT_CLAUSE
        );

        let result = sqlx::query(&sql)
            .bind(scope.as_str())
            .bind(from)
            .bind(to)
            .bind(Uuid::new_v4())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::failed(from, e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound { path: from.to_string() });
        }
        Ok(())
    }
}

impl PostgresStorageBackend {
    async fn ensure_exists(&self, scope: &ScopeId, path: &str) -> Result<(), StorageError> {
        match self.read(scope, path).await? {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound { path: path.to_string() }),
        }
    }
}

/// Escape LIKE metacharacters so user paths match literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// LIKE pattern matching everything nested under `path`
fn descendant_pattern(path: &str) -> String {
    format!("{}%", escape_like(&child_prefix(path)))
}

/// Parse a file record and its modification time from a row
fn parse_file_row(row: &PgRow) -> Result<(VFile, DateTime<Utc>), sqlx::Error> {
    let metadata: Option<serde_json::Value> = row.try_get("metadata")?;
    let file = VFile {
        path: row.try_get("path")?,
        content: row.try_get("content")?,
        content_type: row.try_get("content_type")?,
        description: row.try_get("description")?,
        metadata: metadata.and_then(|value| match value {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        }),
    };
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
    Ok((file, updated_at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("/plain/path"), "/plain/path");
        assert_eq!(escape_like("/100%_done"), "/100\\%\\_done");
        assert_eq!(escape_like("/back\\slash"), "/back\\\\slash");
    }

    #[test]
    fn test_descendant_pattern_uses_separator() {
        assert_eq!(descendant_pattern("/a"), "/a/%");
        assert_eq!(descendant_pattern("/"), "/%");
        assert_eq!(descendant_pattern("/my_dir"), "/my\\_dir/%");
    }

    // Integration tests require a running PostgreSQL instance
    // Run with: STUDIO_VFS_TEST_DATABASE_URL=postgres://... cargo test -- --ignored

    async fn connect() -> PostgresStorageBackend {
        let url = std::env::var("STUDIO_VFS_TEST_DATABASE_URL")
            .expect("STUDIO_VFS_TEST_DATABASE_URL must be set for postgres tests");
        let db = crate::infrastructure::db::Database::new(&url).await.unwrap();
        db.migrate().await.unwrap();
        PostgresStorageBackend::new(db.get_pool().clone())
    }

    #[tokio::test]
    #[ignore]
    async fn integration_test_upsert_preserves_description() {
        let backend = connect().await;
        let scope = ScopeId::new(format!("pg-{}", Uuid::new_v4())).unwrap();

        backend
            .write(&scope, VFile::new("/a.txt", "one").with_description("kept"))
            .await
            .unwrap();
        backend.write(&scope, VFile::new("/a.txt", "two")).await.unwrap();

        let file = backend.read(&scope, "/a.txt").await.unwrap().unwrap();
        assert_eq!(file.content, "two");
        assert_eq!(file.description.as_deref(), Some("kept"));
        assert_eq!(backend.list(&scope).await.unwrap().len(), 1);
    }

    #[tokio::test]
    #[ignore]
    async fn integration_test_recursive_delete_boundary() {
        let backend = connect().await;
        let scope = ScopeId::new(format!("pg-{}", Uuid::new_v4())).unwrap();
        for path in ["/a", "/a/b", "/a/bb", "/ab", "/a_b"] {
            backend.write(&scope, VFile::new(path, "x")).await.unwrap();
        }

        backend.delete(&scope, "/a", DeleteOptions::recursive()).await.unwrap();

        let remaining: Vec<_> = backend
            .list(&scope)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.path)
            .collect();
        assert_eq!(remaining, vec!["/a_b".to_string(), "/ab".to_string()]);
    }

    #[tokio::test]
    #[ignore]
    async fn integration_test_native_move() {
        let backend = connect().await;
        let scope = ScopeId::new(format!("pg-{}", Uuid::new_v4())).unwrap();
        backend.write(&scope, VFile::new("/x", "payload")).await.unwrap();
        backend.write(&scope, VFile::new("/y", "old")).await.unwrap();

        backend.move_file(&scope, "/x", "/y").await.unwrap();
        assert!(backend.read(&scope, "/x").await.unwrap().is_none());
        assert_eq!(backend.read(&scope, "/y").await.unwrap().unwrap().content, "payload");

        let err = backend.move_file(&scope, "/missing", "/z").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }
}
