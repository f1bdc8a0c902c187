//! User resource
//!
//! Emails are trimmed, lowercased and unique. Passwords never leave the
//! service: only their Argon2id hash is stored and no view carries it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Resource, UniqueField, WriteContext};
use crate::ids::ResourceId;
use crate::query::{FilterField, FilterValue};
use crate::repository::{RepositoryError, RepositoryOperation, RepositoryResult};
use crate::validation::{self, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: ResourceId,
    pub name: String,
    pub email: String,
    /// Argon2id PHC string
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User create payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// User partial update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Public user representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: ResourceId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Project a user into its public fields
pub fn transform(user: &User) -> UserView {
    UserView {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn hash_password(
    ctx: &WriteContext<'_>,
    password: &str,
    operation: RepositoryOperation,
) -> RepositoryResult<String> {
    ctx.hasher
        .hash(password)
        .map_err(|e| RepositoryError::serialization_error(operation, e.to_string()))
}

impl Resource for User {
    type Create = CreateUser;
    type Update = UpdateUser;
    type View = UserView;

    const COLLECTION: &'static str = "users";
    const ENTITY: &'static str = "User";
    const FILTERABLE: &'static [FilterField] =
        &[FilterField::text("name"), FilterField::text("role")];
    const UNIQUE: Option<UniqueField> = Some(UniqueField {
        field: "email",
        message: "Email already taken",
    });

    fn id(&self) -> ResourceId {
        self.id
    }

    fn build(id: ResourceId, data: CreateUser, ctx: &WriteContext<'_>) -> RepositoryResult<Self> {
        let email = normalize_email(&data.email);
        let role = data.role.as_deref().unwrap_or("user");

        let mut errors = ValidationErrors::new();
        errors.record(validation::required_text("name", &data.name));
        errors.record(validation::email(&email));
        errors.record(validation::password(&data.password));
        errors.record(validation::role(role));
        errors.into_result()?;

        Ok(Self {
            id,
            name: data.name.trim().to_string(),
            email,
            password_hash: hash_password(ctx, &data.password, RepositoryOperation::Create)?,
            role: Role::parse(role).unwrap_or_default(),
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    fn merge(&mut self, data: UpdateUser, ctx: &WriteContext<'_>) -> RepositoryResult<()> {
        let mut errors = ValidationErrors::new();

        if let Some(name) = data.name {
            errors.record(validation::required_text("name", &name));
            self.name = name.trim().to_string();
        }
        if let Some(email) = data.email {
            let email = normalize_email(&email);
            errors.record(validation::email(&email));
            self.email = email;
        }
        if let Some(role) = data.role {
            errors.record(validation::role(&role));
            if let Some(role) = Role::parse(&role) {
                self.role = role;
            }
        }
        let password = data.password;
        if let Some(password) = &password {
            errors.record(validation::password(password));
        }

        errors.into_result()?;

        if let Some(password) = password {
            self.password_hash = hash_password(ctx, &password, RepositoryOperation::Update)?;
        }
        self.updated_at = ctx.now;
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.record(validation::required_text("name", &self.name));
        errors.record(validation::email(&self.email));
        errors.into_result()
    }

    fn unique_value(&self) -> Option<FilterValue> {
        Some(FilterValue::String(self.email.clone()))
    }

    fn unique_in_update(data: &UpdateUser) -> Option<FilterValue> {
        data.email
            .as_deref()
            .map(|email| FilterValue::String(normalize_email(email)))
    }

    fn privileged_update(data: &UpdateUser) -> bool {
        data.role.is_some()
    }

    fn view(&self) -> UserView {
        transform(self)
    }
}
