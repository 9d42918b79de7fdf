//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, PasswordHash, Role, User, UserId, UserName};

use super::diesel_error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
///
/// Email uniqueness is enforced by the `users_email_key` constraint, so
/// racing registrations surface as [`UserPersistenceError::DuplicateEmail`].
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserPersistenceError {
    map_pool_error(error, UserPersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_diesel_error(error, UserPersistenceError::query, UserPersistenceError::connection)
}

fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let corrupt = |field: &str, err: &dyn std::fmt::Display| {
        warn!(user_id = %row.id, field, error = %err, "stored account failed validation");
        UserPersistenceError::query(format!("stored account has invalid {field}"))
    };
    let name = UserName::new(&row.name).map_err(|err| corrupt("name", &err))?;
    let email = EmailAddress::new(&row.email).map_err(|err| corrupt("email", &err))?;
    let role: Role = row.role.parse().map_err(|err| corrupt("role", &err))?;
    Ok(User::new(
        UserId::from_uuid(row.id),
        name,
        email,
        PasswordHash::from_encoded(row.password_hash),
        role,
        row.created_at,
    ))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            name: user.name().as_str(),
            email: user.email().as_str(),
            password_hash: user.password_hash().as_str(),
            role: user.role().as_str(),
            created_at: user.created_at(),
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_unique_violation(&err) {
                    UserPersistenceError::duplicate_email(user.email().as_str())
                } else {
                    diesel_error(err)
                }
            })
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_user).transpose()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    fn row(role: &str, email: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            name: "Ana".to_owned(),
            email: email.to_owned(),
            password_hash: "$argon2id$stub".to_owned(),
            role: role.to_owned(),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn row_round_trips_into_user() {
        let source = row("operador", "ana@municipio.cl");
        let id = source.id;

        let user = row_to_user(source).expect("valid row");

        assert_eq!(user.id().as_uuid(), &id);
        assert_eq!(user.role(), Role::Operator);
        assert_eq!(user.password_hash().as_str(), "$argon2id$stub");
    }

    #[rstest]
    #[case("superuser", "ana@municipio.cl", "role")]
    #[case("ciudadano", "not-an-email", "email")]
    fn corrupt_rows_are_query_errors(#[case] role: &str, #[case] email: &str, #[case] field: &str) {
        let err = row_to_user(row(role, email)).expect_err("corrupt row");

        assert!(matches!(err, UserPersistenceError::Query { .. }));
        assert!(err.to_string().contains(field));
    }

    #[rstest]
    fn pool_failures_are_connection_errors() {
        let err = pool_error(PoolError::checkout("timed out"));

        assert!(matches!(err, UserPersistenceError::Connection { .. }));
    }
}
