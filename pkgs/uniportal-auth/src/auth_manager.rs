//! Authentication manager for handling portal accounts

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::credentials::{self, PasswordVerifier};
use crate::entities::auth_tokens::{PURPOSE_RESET_PASSWORD, PURPOSE_VERIFY_EMAIL};
use crate::entities::{accounts, auth_tokens};
use crate::error::{AuthError, Result};
use crate::session::{Session, UserProfile};
use crate::signup::{normalize_email, AuthPolicy, SignupRejection, SignupRequest};

/// Result of a successful signup
///
/// The account stays unverified until `verification_token` comes back
/// through [`AuthManager::verify_email`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupOutcome {
    pub profile: UserProfile,
    pub verification_token: String,
}

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    db: DatabaseConnection,
    policy: AuthPolicy,
}

impl AuthManager {
    /// Create a new auth manager with the default policy
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_policy(db, AuthPolicy::default())
    }

    pub fn with_policy(db: DatabaseConnection, policy: AuthPolicy) -> Self {
        Self { db, policy }
    }

    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    /// Register a new, unverified account
    pub async fn sign_up(&self, request: SignupRequest) -> Result<SignupOutcome> {
        request.validate(&self.policy)?;

        let email = request.normalized_email();
        info!("Creating account for {}", email);

        if self.find_account(&email).await?.is_some() {
            return Err(AuthError::AccountExists(email));
        }

        let verifier = credentials::hash_password(&request.password)?;
        let uid = uuid::Uuid::new_v4().to_string();

        let account = accounts::ActiveModel {
            uid: Set(uid.clone()),
            email: Set(email.clone()),
            name: Set(request.name.trim().to_string()),
            role: Set(request.role.as_str().to_string()),
            faculty: Set(request.faculty.trim().to_string()),
            degree_program: Set(request.degree_program.trim().to_string()),
            batch_number: Set(request.batch_number.trim().to_string()),
            email_verified: Set(false),
            password_salt: Set(verifier.salt),
            password_hash: Set(verifier.digest),
            created_at: Set(Utc::now().timestamp_millis()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| match e.sql_err() {
            // Lost a race with another signup for the same email
            Some(SqlErr::UniqueConstraintViolation(_)) => AuthError::AccountExists(email.clone()),
            _ => AuthError::Database(e),
        })?;

        let verification_token = self.issue_token(&uid, PURPOSE_VERIFY_EMAIL).await?;

        info!("Account {} created, awaiting verification", uid);

        Ok(SignupOutcome {
            profile: UserProfile::try_from(account)?,
            verification_token,
        })
    }

    /// Mark the account behind `token` as verified
    pub async fn verify_email(&self, token: &str) -> Result<UserProfile> {
        let uid = self.consume_token(token, PURPOSE_VERIFY_EMAIL).await?;

        let account = accounts::Entity::find_by_id(uid.clone())
            .one(&self.db)
            .await?
            .ok_or_else(|| AuthError::UnknownAccount(uid.clone()))?;

        let mut active: accounts::ActiveModel = account.into();
        active.email_verified = Set(true);
        let account = active.update(&self.db).await?;

        info!("Email verified for account {}", uid);
        UserProfile::try_from(account)
    }

    /// Issue a fresh verification token for an unverified account
    pub async fn resend_verification(&self, email: &str) -> Result<String> {
        let email = normalize_email(email);
        let account = self
            .find_account(&email)
            .await?
            .ok_or_else(|| AuthError::UnknownAccount(email.clone()))?;

        if account.email_verified {
            debug!("Account {} already verified", account.uid);
            return Err(AuthError::AlreadyVerified(email));
        }

        self.issue_token(&account.uid, PURPOSE_VERIFY_EMAIL).await
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email);
        info!("Attempting login for {}", email);

        let Some(account) = self.find_account(&email).await? else {
            warn!("Login for unknown email {}", email);
            return Err(AuthError::InvalidCredentials);
        };

        let verifier = PasswordVerifier {
            salt: account.password_salt.clone(),
            digest: account.password_hash.clone(),
        };
        if !credentials::verify_password(password, &verifier)? {
            warn!("Password check failed for {}", account.uid);
            return Err(AuthError::InvalidCredentials);
        }

        if !account.email_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let profile = UserProfile::try_from(account)?;
        info!("Login successful for {}", profile.uid);

        Ok(Session::new(profile))
    }

    /// Start a password reset; the returned token is delivered out of band
    pub async fn request_password_reset(&self, email: &str) -> Result<String> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(SignupRejection::MissingFields.into());
        }

        let account = self
            .find_account(&email)
            .await?
            .ok_or_else(|| AuthError::UnknownAccount(email.clone()))?;

        info!("Password reset requested for {}", account.uid);
        self.issue_token(&account.uid, PURPOSE_RESET_PASSWORD).await
    }

    /// Finish a password reset
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        if new_password.chars().count() < self.policy.min_password_len {
            return Err(SignupRejection::WeakPassword(self.policy.min_password_len).into());
        }

        let uid = self.consume_token(token, PURPOSE_RESET_PASSWORD).await?;

        let account = accounts::Entity::find_by_id(uid.clone())
            .one(&self.db)
            .await?
            .ok_or_else(|| AuthError::UnknownAccount(uid.clone()))?;

        let verifier = credentials::hash_password(new_password)?;
        let mut active: accounts::ActiveModel = account.into();
        active.password_salt = Set(verifier.salt);
        active.password_hash = Set(verifier.digest);
        active.update(&self.db).await?;

        info!("Password reset for account {}", uid);
        Ok(())
    }

    /// Look up a profile by uid
    pub async fn profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        accounts::Entity::find_by_id(uid.to_string())
            .one(&self.db)
            .await?
            .map(UserProfile::try_from)
            .transpose()
    }

    /// Look up a profile by email
    pub async fn profile_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        self.find_account(&normalize_email(email))
            .await?
            .map(UserProfile::try_from)
            .transpose()
    }

    async fn find_account(&self, email: &str) -> Result<Option<accounts::Model>> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    async fn issue_token(&self, uid: &str, purpose: &str) -> Result<String> {
        let now = Utc::now();
        let token = credentials::generate_token();

        auth_tokens::ActiveModel {
            token: Set(token.clone()),
            uid: Set(uid.to_string()),
            purpose: Set(purpose.to_string()),
            expires_at: Set((now + self.policy.token_ttl).timestamp_millis()),
            consumed: Set(false),
            created_at: Set(now.timestamp_millis()),
        }
        .insert(&self.db)
        .await?;

        debug!("Issued {} token for {}", purpose, uid);
        Ok(token)
    }

    async fn consume_token(&self, token: &str, purpose: &str) -> Result<String> {
        let record = auth_tokens::Entity::find_by_id(token.to_string())
            .one(&self.db)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let now = Utc::now().timestamp_millis();
        if record.purpose != purpose || record.consumed || record.expires_at <= now {
            warn!("Rejected {} token for {}", purpose, record.uid);
            return Err(AuthError::InvalidToken);
        }

        let uid = record.uid.clone();
        let mut active: auth_tokens::ActiveModel = record.into();
        active.consumed = Set(true);
        active.update(&self.db).await?;

        Ok(uid)
    }
}
