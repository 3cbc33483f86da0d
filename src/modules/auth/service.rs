use chrono::Utc;
use tracing::{info, instrument, warn};

use lestari_auth::TokenService;
use lestari_core::{AppError, Role};
use lestari_models::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, SellerInfo,
    UpgradeToSellerRequest, User,
};

use crate::middleware::auth::AuthUser;
use crate::store::{NewUser, SecretChange, UserStore};

pub struct AuthService;

impl AuthService {
    fn respond_with_token(tokens: &TokenService, user: User) -> Result<AuthResponse, AppError> {
        let token = tokens.issue_access_token(user.id.into_inner(), user.role)?;
        Ok(AuthResponse { token, user })
    }

    #[instrument(skip(users, tokens, dto), fields(email = %dto.email))]
    pub async fn register(
        users: &dyn UserStore,
        tokens: &TokenService,
        dto: RegisterRequest,
    ) -> Result<AuthResponse, AppError> {
        let role = dto.role.unwrap_or_default();
        if !role.is_self_assignable() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Role must be either client or seller"
            )));
        }

        let seller_info = (role == Role::Seller).then(|| SellerInfo::default_for(&dto.name));

        let user = users
            .insert(NewUser {
                name: dto.name,
                email: dto.email,
                phone: dto.phone,
                password: dto.password,
                role,
                seller_info,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        Self::respond_with_token(tokens, user)
    }

    #[instrument(skip(users, tokens, dto), fields(email = %dto.email))]
    pub async fn login(
        users: &dyn UserStore,
        tokens: &TokenService,
        dto: LoginRequest,
    ) -> Result<AuthResponse, AppError> {
        let credentials = users
            .find_by_email(&dto.email)
            .await?
            .filter(|credentials| credentials.user.is_active)
            .filter(|credentials| credentials.verify_secret(&dto.password))
            .ok_or_else(|| {
                warn!("Failed login attempt");
                AppError::unauthorized("Incorrect email or password")
            })?;

        let mut user = credentials.user;
        let now = Utc::now();
        users.record_login(user.id, now).await?;
        user.last_login = Some(now);

        Self::respond_with_token(tokens, user)
    }

    #[instrument(skip(users, tokens, auth_user, dto), fields(user_id = %auth_user.id()))]
    pub async fn upgrade_to_seller(
        users: &dyn UserStore,
        tokens: &TokenService,
        auth_user: &AuthUser,
        dto: UpgradeToSellerRequest,
    ) -> Result<AuthResponse, AppError> {
        match auth_user.role() {
            Role::Client => {}
            Role::Seller => {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "You are already a seller"
                )));
            }
            Role::Admin => {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Admin accounts cannot become sellers"
                )));
            }
        }

        let mut user = auth_user.user.clone();
        let mut seller_info = SellerInfo::default_for(&user.name);
        seller_info.business_name = dto.business_name;
        seller_info.business_type = dto.business_type;
        seller_info.city = dto.city;

        user.role = Role::Seller;
        user.seller_info = Some(seller_info);

        let user = users.save(&user, SecretChange::Keep).await?;
        info!(user_id = %user.id, "User upgraded to seller");
        Self::respond_with_token(tokens, user)
    }

    /// Replaces the password. Tokens issued before the change stop working;
    /// the response carries a fresh one.
    #[instrument(skip(users, tokens, auth_user, dto), fields(user_id = %auth_user.id()))]
    pub async fn change_password(
        users: &dyn UserStore,
        tokens: &TokenService,
        auth_user: &AuthUser,
        dto: ChangePasswordRequest,
    ) -> Result<AuthResponse, AppError> {
        let credentials = users
            .find_by_email(&auth_user.user.email)
            .await?
            .ok_or_else(|| AppError::unauthorized("The user belonging to this token no longer exists"))?;

        if !credentials.verify_secret(&dto.current_password) {
            return Err(AppError::unauthorized("Your current password is wrong"));
        }

        let user = users
            .save(&credentials.user, SecretChange::Replace(dto.new_password))
            .await?;

        info!(user_id = %user.id, "Password changed");
        Self::respond_with_token(tokens, user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use lestari_config::JwtConfig;
    use lestari_models::BusinessType;

    use crate::store::MemoryStore;

    fn tokens() -> TokenService {
        TokenService::new(&JwtConfig {
            secret: "rahasia-untuk-pengujian".to_string(),
            access_token_expiry: 3600,
        })
    }

    fn register_request(email: &str, role: Option<Role>) -> RegisterRequest {
        RegisterRequest {
            name: "Sari".to_string(),
            email: email.to_string(),
            phone: "08123456789".to_string(),
            password: "rahasia123".to_string(),
            role,
        }
    }

    fn authenticated(tokens: &TokenService, user: User) -> AuthUser {
        let token = tokens
            .issue_access_token(user.id.into_inner(), user.role)
            .unwrap();
        AuthUser {
            principal: tokens.verify(&token).unwrap(),
            user,
        }
    }

    #[tokio::test]
    async fn test_register_seller_gets_default_business() {
        let store = MemoryStore::new(4);
        let tokens = tokens();

        let response = AuthService::register(
            &store,
            &tokens,
            register_request("sari@example.com", Some(Role::Seller)),
        )
        .await
        .unwrap();

        assert_eq!(response.user.role, Role::Seller);
        let seller_info = response.user.seller_info.unwrap();
        assert_eq!(seller_info.business_name, "Sari's Business");
        assert_eq!(seller_info.business_type, BusinessType::Individu);

        let verified = tokens.verify(&response.token).unwrap();
        assert_eq!(verified.principal_id, response.user.id.into_inner());
    }

    #[tokio::test]
    async fn test_register_rejects_admin_role() {
        let store = MemoryStore::new(4);

        let err = AuthService::register(
            &store,
            &tokens(),
            register_request("admin@example.com", Some(Role::Admin)),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_records_last_login() {
        let store = MemoryStore::new(4);
        let tokens = tokens();
        AuthService::register(&store, &tokens, register_request("sari@example.com", None))
            .await
            .unwrap();

        let response = AuthService::login(
            &store,
            &tokens,
            LoginRequest {
                email: "sari@example.com".to_string(),
                password: "rahasia123".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(response.user.last_login.is_some());

        let err = AuthService::login(
            &store,
            &tokens,
            LoginRequest {
                email: "sari@example.com".to_string(),
                password: "salah-sandi".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upgrade_to_seller_once() {
        let store = MemoryStore::new(4);
        let tokens = tokens();
        let registered =
            AuthService::register(&store, &tokens, register_request("sari@example.com", None))
                .await
                .unwrap();
        let auth_user = authenticated(&tokens, registered.user);

        let upgraded = AuthService::upgrade_to_seller(
            &store,
            &tokens,
            &auth_user,
            UpgradeToSellerRequest {
                business_name: "Anyaman Sari".to_string(),
                business_type: BusinessType::Koperasi,
                city: Some("Yogyakarta".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(upgraded.user.role, Role::Seller);
        assert_eq!(
            upgraded.user.seller_info.as_ref().map(|info| info.business_name.as_str()),
            Some("Anyaman Sari")
        );

        let seller = authenticated(&tokens, upgraded.user);
        let err = AuthService::upgrade_to_seller(
            &store,
            &tokens,
            &seller,
            UpgradeToSellerRequest {
                business_name: "Lagi".to_string(),
                business_type: BusinessType::default(),
                city: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_change_password_requires_current_password() {
        let store = MemoryStore::new(4);
        let tokens = tokens();
        let registered =
            AuthService::register(&store, &tokens, register_request("sari@example.com", None))
                .await
                .unwrap();
        let auth_user = authenticated(&tokens, registered.user);

        let err = AuthService::change_password(
            &store,
            &tokens,
            &auth_user,
            ChangePasswordRequest {
                current_password: "bukan-sandi".to_string(),
                new_password: "sandibaru123".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let changed = AuthService::change_password(
            &store,
            &tokens,
            &auth_user,
            ChangePasswordRequest {
                current_password: "rahasia123".to_string(),
                new_password: "sandibaru123".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(changed.user.credential_changed_at.is_some());
    }
}
