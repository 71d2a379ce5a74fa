//! Customer/project directory trait and implementations.
//!
//! The relational directory answers "which project does this identity
//! belong to" and resolves client rows. It is an external collaborator;
//! the in-memory double backs tests and the default wiring.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{ClientId, ProjectId};
use sqlx::{PgPool, Row};

use crate::error::{CheckoutError, Result};

/// Trait for directory lookups.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolves the project a customer belongs to, by email.
    async fn resolve_project_for_customer(&self, email: &str) -> Result<Option<ProjectId>>;

    /// Resolves the project an administrator operates, by username.
    async fn resolve_project_for_admin(&self, username: &str) -> Result<Option<ProjectId>>;

    /// Finds a client row by national identity number.
    async fn find_client_by_dni(&self, dni: &str) -> Result<Option<ClientId>>;

    /// Finds a client row by email.
    async fn find_client_by_email(&self, email: &str) -> Result<Option<ClientId>>;
}

#[derive(Debug, Default)]
struct InMemoryDirectoryState {
    customer_projects: HashMap<String, ProjectId>,
    admin_projects: HashMap<String, ProjectId>,
    clients_by_dni: HashMap<String, ClientId>,
    clients_by_email: HashMap<String, ClientId>,
}

/// In-memory directory for tests and the default wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<RwLock<InMemoryDirectoryState>>,
}

impl InMemoryDirectory {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a customer email to a project.
    pub fn assign_customer(&self, email: impl Into<String>, project_id: ProjectId) {
        self.state
            .write()
            .unwrap()
            .customer_projects
            .insert(email.into(), project_id);
    }

    /// Assigns an admin username to a project.
    pub fn assign_admin(&self, username: impl Into<String>, project_id: ProjectId) {
        self.state
            .write()
            .unwrap()
            .admin_projects
            .insert(username.into(), project_id);
    }

    /// Registers a client row reachable by DNI and email.
    pub fn register_client(&self, client_id: ClientId, dni: Option<&str>, email: Option<&str>) {
        let mut state = self.state.write().unwrap();
        if let Some(dni) = dni {
            state.clients_by_dni.insert(dni.to_string(), client_id);
        }
        if let Some(email) = email {
            state.clients_by_email.insert(email.to_string(), client_id);
        }
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn resolve_project_for_customer(&self, email: &str) -> Result<Option<ProjectId>> {
        Ok(self.state.read().unwrap().customer_projects.get(email).cloned())
    }

    async fn resolve_project_for_admin(&self, username: &str) -> Result<Option<ProjectId>> {
        Ok(self.state.read().unwrap().admin_projects.get(username).cloned())
    }

    async fn find_client_by_dni(&self, dni: &str) -> Result<Option<ClientId>> {
        Ok(self.state.read().unwrap().clients_by_dni.get(dni).copied())
    }

    async fn find_client_by_email(&self, email: &str) -> Result<Option<ClientId>> {
        Ok(self.state.read().unwrap().clients_by_email.get(email).copied())
    }
}

/// Directory backed by the relational store's client/admin tables.
#[derive(Clone)]
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    /// Creates a directory over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PostgresDirectory {
    async fn resolve_project_for_customer(&self, email: &str) -> Result<Option<ProjectId>> {
        let row = sqlx::query("SELECT proyecto_f FROM clientes WHERE email = $1 LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CheckoutError::Directory(e.to_string()))?;

        Ok(row.and_then(|r| {
            r.try_get::<Option<i64>, _>("proyecto_f")
                .ok()
                .flatten()
                .map(|id| ProjectId::new(id.to_string()))
        }))
    }

    async fn resolve_project_for_admin(&self, username: &str) -> Result<Option<ProjectId>> {
        let row = sqlx::query(
            r#"
            SELECT p.proyecto_id
            FROM p_c p
            INNER JOIN administradores a ON p.cliente_id = a.cliente_id
            WHERE a.usuario = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CheckoutError::Directory(e.to_string()))?;

        Ok(row.and_then(|r| {
            r.try_get::<Option<i64>, _>("proyecto_id")
                .ok()
                .flatten()
                .map(|id| ProjectId::new(id.to_string()))
        }))
    }

    async fn find_client_by_dni(&self, dni: &str) -> Result<Option<ClientId>> {
        let row = sqlx::query("SELECT id FROM clientes WHERE dni = $1 LIMIT 1")
            .bind(dni)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CheckoutError::Directory(e.to_string()))?;

        Ok(row.and_then(|r| r.try_get::<i64, _>("id").ok().map(ClientId::new)))
    }

    async fn find_client_by_email(&self, email: &str) -> Result<Option<ClientId>> {
        let row = sqlx::query("SELECT id FROM clientes WHERE email = $1 LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CheckoutError::Directory(e.to_string()))?;

        Ok(row.and_then(|r| r.try_get::<i64, _>("id").ok().map(ClientId::new)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn customer_project_assignment() {
        let directory = InMemoryDirectory::new();
        directory.assign_customer("ana@example.com", ProjectId::new("1"));

        let project = directory
            .resolve_project_for_customer("ana@example.com")
            .await
            .unwrap();
        assert_eq!(project, Some(ProjectId::new("1")));

        let none = directory
            .resolve_project_for_customer("otro@example.com")
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn admin_project_assignment() {
        let directory = InMemoryDirectory::new();
        directory.assign_admin("tendero", ProjectId::new("2"));

        let project = directory.resolve_project_for_admin("tendero").await.unwrap();
        assert_eq!(project, Some(ProjectId::new("2")));
    }

    #[tokio::test]
    async fn client_lookup_by_dni_and_email() {
        let directory = InMemoryDirectory::new();
        directory.register_client(ClientId::new(7), Some("12345678"), Some("ana@example.com"));

        assert_eq!(
            directory.find_client_by_dni("12345678").await.unwrap(),
            Some(ClientId::new(7))
        );
        assert_eq!(
            directory.find_client_by_email("ana@example.com").await.unwrap(),
            Some(ClientId::new(7))
        );
        assert!(directory.find_client_by_dni("0").await.unwrap().is_none());
    }
}
