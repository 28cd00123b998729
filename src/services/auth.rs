use crate::{
    config::auth::AuthConfig,
    error::{AppError, AppResult},
    models::{
        password_reset_token, user, verification_token, PasswordResetToken, User, UserModel,
        VerificationToken,
    },
    services::email::EmailService,
    utils::{
        encode_access_token, encode_refresh_token, hash_password,
        jwt::{decode_jwt, TokenKind},
        verify_password,
    },
};
use chrono::{Duration, NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait,
};

/// Access and refresh token pair handed out on login, register and refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn issue_tokens(user_id: i32) -> AppResult<TokenPair> {
    Ok(TokenPair {
        access_token: encode_access_token(user_id)?,
        refresh_token: encode_refresh_token(user_id)?,
    })
}

fn new_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn is_expired(expires_at: NaiveDateTime) -> bool {
    Utc::now().naive_utc() > expires_at
}

pub struct AuthService {
    db: DatabaseConnection,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            config: AuthConfig::from_env(),
        }
    }

    /// Create an account. When verification is required the user starts
    /// unverified and a verification link is mailed.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        email_service: &EmailService,
    ) -> AppResult<(UserModel, TokenPair)> {
        if self.user_exists(username, email).await? {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let now = Utc::now().naive_utc();
        let verified = !self.config.require_email_verification;

        let txn = self.db.begin().await?;
        let user = user::ActiveModel {
            email: Set(email.to_string()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            verified: Set(verified),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let token = if verified {
            None
        } else {
            Some(self.create_verification_token(&txn, user.id).await?)
        };
        txn.commit().await?;

        if let Some(token) = token {
            if let Err(e) = email_service
                .send_verification_email(
                    &user.email,
                    &token,
                    self.config.verification_token_ttl_hours,
                )
                .await
            {
                tracing::warn!("Failed to send verification email: {e}");
            }
        }

        tracing::info!(user_id = user.id, "user registered");
        let tokens = issue_tokens(user.id)?;
        Ok((user, tokens))
    }

    /// `login` matches either the username or the email address.
    pub async fn login(&self, login: &str, password: &str) -> AppResult<(UserModel, TokenPair)> {
        let user = User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(login))
                    .add(user::Column::Email.eq(login)),
            )
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let tokens = issue_tokens(user.id)?;
        Ok((user, tokens))
    }

    /// Exchange a refresh token for a fresh pair.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = decode_jwt(refresh_token).map_err(|_| AppError::Unauthorized)?;
        if claims.kind != TokenKind::Refresh {
            return Err(AppError::Unauthorized);
        }
        let user_id = claims.user_id().ok_or(AppError::Unauthorized)?;

        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        issue_tokens(user_id)
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn verify_email(&self, token: &str) -> AppResult<()> {
        let record = VerificationToken::find()
            .filter(verification_token::Column::Token.eq(token))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid verification token".to_string()))?;

        if is_expired(record.expires_at) {
            return Err(AppError::Validation(
                "Verification token has expired".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let user = User::find_by_id(record.user_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: user::ActiveModel = user.into();
        active.verified = Set(true);
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(&txn).await?;

        VerificationToken::delete_many()
            .filter(verification_token::Column::UserId.eq(record.user_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(user_id = record.user_id, "email verified");
        Ok(())
    }

    /// Replace any outstanding verification token and mail a new one.
    pub async fn resend_verification(
        &self,
        user_id: i32,
        email_service: &EmailService,
    ) -> AppResult<()> {
        let user = self.get_user_by_id(user_id).await?;
        if user.verified {
            return Err(AppError::Validation("Email is already verified".to_string()));
        }

        let txn = self.db.begin().await?;
        VerificationToken::delete_many()
            .filter(verification_token::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        let token = self.create_verification_token(&txn, user_id).await?;
        txn.commit().await?;

        if let Err(e) = email_service
            .send_verification_email(&user.email, &token, self.config.verification_token_ttl_hours)
            .await
        {
            tracing::warn!("Failed to send verification email: {e}");
        }
        Ok(())
    }

    /// Succeeds whether or not the address belongs to an account.
    pub async fn forgot_password(&self, email: &str, email_service: &EmailService) -> AppResult<()> {
        let Some(user) = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
        else {
            return Ok(());
        };

        let token = new_token();
        let now = Utc::now().naive_utc();
        password_reset_token::ActiveModel {
            user_id: Set(user.id),
            token: Set(token.clone()),
            expires_at: Set(now + Duration::minutes(self.config.password_reset_ttl_minutes)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        if let Err(e) = email_service
            .send_password_reset_email(&user.email, &token, self.config.password_reset_ttl_minutes)
            .await
        {
            tracing::warn!("Failed to send password reset email: {e}");
        }
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let record = PasswordResetToken::find()
            .filter(password_reset_token::Column::Token.eq(token))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid reset token".to_string()))?;

        if is_expired(record.expires_at) {
            return Err(AppError::Validation("Reset token has expired".to_string()));
        }

        let new_hash = hash_password(new_password)?;

        let txn = self.db.begin().await?;
        let user = User::find_by_id(record.user_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(&txn).await?;

        PasswordResetToken::delete_many()
            .filter(password_reset_token::Column::UserId.eq(record.user_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(user_id = record.user_id, "password reset");
        Ok(())
    }

    async fn user_exists(&self, username: &str, email: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn create_verification_token<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
    ) -> AppResult<String> {
        let token = new_token();
        let now = Utc::now().naive_utc();
        verification_token::ActiveModel {
            user_id: Set(user_id),
            token: Set(token.clone()),
            expires_at: Set(now + Duration::hours(self.config.verification_token_ttl_hours)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(token)
    }
}
