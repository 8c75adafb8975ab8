use crate::auth::{PasswordHasher, TokenIssuer, TokenType};
use crate::store::{AirportStore, StoreResult, UNIQUE_EMAIL_MESSAGE};
use crate::validation::{too_long, too_short, Validator, BLANK};
use airport_models::{
    AccessToken, AirportError, NewUser, RefreshRequest, RegisterRequest, TokenPair, TokenRequest,
    User, UserPatch, UserView, VerifyRequest,
};
use std::sync::Arc;
use validator::ValidateEmail;
use tracing::{info, instrument, warn};

pub const EMAIL_MAX: usize = 254;
pub const PASSWORD_MIN: usize = 5;
pub const INVALID_EMAIL: &str = "Enter a valid email address.";

/// RFC 5322 syntax check; the domain must also carry a top-level label
/// unless it is `localhost`.
fn looks_like_email(email: &str) -> bool {
    let qualified = email
        .rsplit_once('@')
        .is_some_and(|(_, domain)| domain.contains('.') || domain == "localhost");
    qualified && email.validate_email()
}

/// Lowercases the domain part only, the way mail addresses are normalized.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn check_email(validator: &mut Validator, email: &str) {
    if email.is_empty() {
        validator.add("email", BLANK);
    } else if email.chars().count() > EMAIL_MAX {
        validator.add("email", too_long(EMAIL_MAX));
    } else if !looks_like_email(email) {
        validator.add("email", INVALID_EMAIL);
    }
}

fn check_password(validator: &mut Validator, password: &str) {
    if password.is_empty() {
        validator.add("password", BLANK);
    } else if password.chars().count() < PASSWORD_MIN {
        validator.add("password", too_short(PASSWORD_MIN));
    }
}

/// Registration, token issuance and the current user's profile.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AirportStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl AccountService {
    pub fn new(store: Arc<dyn AirportStore>, tokens: TokenIssuer) -> Self {
        Self {
            store,
            hasher: PasswordHasher::new(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    async fn create_user(&self, email: &str, password: &str, is_staff: bool) -> StoreResult<User> {
        let email = normalize_email(email);
        let mut validator = Validator::new();
        check_email(&mut validator, &email);
        check_password(&mut validator, password);
        if validator.is_valid() && self.store.user_by_email(&email).await?.is_some() {
            validator.add("email", UNIQUE_EMAIL_MESSAGE);
        }
        validator.finish()?;

        let password_hash = self.hasher.hash_blocking(password.to_string()).await?;
        self.store
            .insert_user(NewUser {
                email,
                password_hash,
                is_staff,
            })
            .await
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> StoreResult<UserView> {
        let user = self.create_user(&request.email, &request.password, false).await?;
        info!("Registered user {}", user.id);
        Ok(UserView::from(&user))
    }

    /// Staff account for the management CLI.
    #[instrument(skip(self, password))]
    pub async fn create_superuser(&self, email: &str, password: &str) -> StoreResult<UserView> {
        let user = self.create_user(email, password, true).await?;
        info!("Created staff user {}", user.id);
        Ok(UserView::from(&user))
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn obtain_token(&self, request: TokenRequest) -> StoreResult<TokenPair> {
        let mut validator = Validator::new();
        if request.email.trim().is_empty() {
            validator.add("email", BLANK);
        }
        if request.password.is_empty() {
            validator.add("password", BLANK);
        }
        validator.finish()?;

        let user = self
            .store
            .user_by_email(&normalize_email(&request.email))
            .await?;
        let verified = match &user {
            Some(user) => {
                self.hasher
                    .verify_blocking(request.password.clone(), user.password_hash.clone())
                    .await?
            }
            None => false,
        };
        let user = user
            .filter(|_| verified)
            .ok_or_else(|| {
                warn!("Rejected credentials");
                AirportError::InvalidCredentials
            })?;

        Ok(TokenPair {
            access: self.tokens.issue(&user, TokenType::Access)?,
            refresh: self.tokens.issue(&user, TokenType::Refresh)?,
        })
    }

    pub async fn refresh_token(&self, request: RefreshRequest) -> StoreResult<AccessToken> {
        let claims = self.tokens.decode(&request.refresh, Some(TokenType::Refresh))?;
        let user = self.user_for_token(claims.user_id).await?;
        Ok(AccessToken {
            access: self.tokens.issue(&user, TokenType::Access)?,
        })
    }

    /// Any valid token of either type passes.
    pub async fn verify_token(&self, request: VerifyRequest) -> StoreResult<()> {
        self.tokens.decode(&request.token, None)?;
        Ok(())
    }

    /// Resolve the user behind a bearer access token.
    pub async fn authenticate(&self, access_token: &str) -> StoreResult<User> {
        let claims = self.tokens.decode(access_token, Some(TokenType::Access))?;
        self.user_for_token(claims.user_id).await
    }

    async fn user_for_token(&self, user_id: i64) -> StoreResult<User> {
        self.store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| AirportError::InvalidToken {
                reason: "User not found".to_string(),
            })
    }

    pub fn me(&self, user: &User) -> UserView {
        UserView::from(user)
    }

    #[instrument(skip(self, user, patch), fields(user_id = user.id))]
    pub async fn update_me(&self, user: &User, patch: UserPatch) -> StoreResult<UserView> {
        let mut updated = user.clone();
        let mut validator = Validator::new();

        if let Some(email) = patch.email {
            let email = normalize_email(&email);
            check_email(&mut validator, &email);
            if validator.is_valid() {
                let owner = self.store.user_by_email(&email).await?;
                if owner.is_some_and(|owner| owner.id != user.id) {
                    validator.add("email", UNIQUE_EMAIL_MESSAGE);
                }
            }
            updated.email = email;
        }
        if let Some(password) = &patch.password {
            check_password(&mut validator, password);
        }
        validator.finish()?;

        if let Some(password) = patch.password {
            updated.password_hash = self.hasher.hash_blocking(password).await?;
        }
        self.store.update_user(&updated).await?;
        Ok(UserView::from(&updated))
    }
}
