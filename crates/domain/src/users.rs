//! Storefront accounts.

use chrono::{DateTime, Utc};
use common::{Caller, Role, UserId};
use document_store::{DocumentStore, FieldFilter};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Repository};
use crate::error::DomainError;

/// A storefront account. Credentials live with the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    const COLLECTION: &'static str = "users";
    const NAME: &'static str = "User";

    fn id(&self) -> UserId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl User {
    /// Returns the caller context for this user.
    pub fn caller(&self) -> Caller {
        Caller::new(self.id, self.role)
    }
}

fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(DomainError::invalid(format!("invalid email address: {email:?}"))),
    }
}

/// Service for registering and looking up users.
pub struct UserService<S: DocumentStore> {
    users: Repository<S, User>,
}

impl<S: DocumentStore> UserService<S> {
    pub fn new(store: S) -> Self {
        Self {
            users: Repository::new(store),
        }
    }

    /// Registers a new user. Emails are compared after trimming and
    /// lower-casing and must be unique.
    #[tracing::instrument(skip(self))]
    pub async fn register(&self, email: &str, role: Role) -> Result<User, DomainError> {
        let email = normalize_email(email)?;
        if self.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "email {email} is already registered"
            )));
        }

        let user = User {
            id: UserId::new(),
            email,
            role,
            created_at: Utc::now(),
        };
        self.users.insert(&user).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Looks up a user by email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = normalize_email(email)?;
        let query = self
            .users
            .query()
            .filter(FieldFilter::equals("email", email))
            .limit(1);
        Ok(self.users.find(query).await?.into_iter().next())
    }

    /// Resolves the client account a new session is issued for.
    ///
    /// Administrator sessions come only from configuration, so admin
    /// accounts cannot sign in here.
    #[tracing::instrument(skip(self))]
    pub async fn sign_in(&self, email: &str) -> Result<User, DomainError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found(User::NAME, email.trim()))?;
        if user.role == Role::Admin {
            return Err(DomainError::Forbidden(
                "administrators sign in with their configured token".to_string(),
            ));
        }
        tracing::info!(user_id = %user.id, "user signed in");
        Ok(user)
    }

    pub async fn get(&self, id: UserId) -> Result<User, DomainError> {
        self.users.require(id).await
    }

    /// Returns the caller's own account.
    pub async fn me(&self, caller: &Caller) -> Result<User, DomainError> {
        self.users.require(caller.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use document_store::InMemoryDocumentStore;

    use super::*;
    use crate::error::ErrorKind;

    fn service() -> UserService<InMemoryDocumentStore> {
        UserService::new(InMemoryDocumentStore::new())
    }

    #[tokio::test]
    async fn register_normalizes_email() {
        let users = service();
        let user = users.register("  Ada@Example.COM ", Role::Client).await.unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(users.get(user.id).await.unwrap(), user);
    }

    #[tokio::test]
    async fn sign_in_finds_clients_by_normalized_email() {
        let users = service();
        let user = users.register("ada@example.com", Role::Client).await.unwrap();

        assert_eq!(users.sign_in(" ADA@example.com").await.unwrap(), user);
    }

    #[tokio::test]
    async fn sign_in_rejects_unknown_and_admin_accounts() {
        let users = service();
        users.register("root@example.com", Role::Admin).await.unwrap();

        let unknown = users.sign_in("nobody@example.com").await.unwrap_err();
        let admin = users.sign_in("root@example.com").await.unwrap_err();

        assert_eq!(unknown.kind(), ErrorKind::NotFound);
        assert_eq!(admin.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let users = service();
        users.register("ada@example.com", Role::Client).await.unwrap();

        let err = users
            .register("ADA@example.com", Role::Admin)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn blank_or_malformed_email_is_invalid() {
        let users = service();
        for email in ["", "   ", "no-at-sign", "@example.com", "ada@"] {
            let err = users.register(email, Role::Client).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{email:?}");
        }
    }

    #[tokio::test]
    async fn me_returns_callers_account() {
        let users = service();
        let user = users.register("admin@example.com", Role::Admin).await.unwrap();

        let me = users.me(&user.caller()).await.unwrap();
        assert_eq!(me.id, user.id);
        assert!(me.caller().is_admin());

        let stranger = Caller::client(UserId::new());
        assert_eq!(
            users.me(&stranger).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
