//! Administrative commands run outside the HTTP server.

use validator::Validate;

use lestari_core::{AppError, Role};
use lestari_models::{RegisterRequest, User};

use crate::store::{NewUser, UserStore};

/// Creates an admin account. Admins cannot register through the API.
///
/// The same rules as registration apply to name, email, phone and
/// password.
pub async fn create_admin(
    users: &dyn UserStore,
    name: &str,
    email: &str,
    phone: &str,
    password: &str,
) -> Result<User, AppError> {
    let request = RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        password: password.to_string(),
        role: None,
    };
    request.validate().map_err(AppError::unprocessable)?;

    users
        .insert(NewUser {
            name: request.name,
            email: request.email,
            phone: request.phone,
            password: request.password,
            role: Role::Admin,
            seller_info: None,
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_create_admin() {
        let store = MemoryStore::new(4);
        let admin = create_admin(&store, "Admin", "admin@example.com", "081234567890", "rahasia123")
            .await
            .unwrap();

        assert_eq!(admin.role, Role::Admin);
        assert!(admin.seller_info.is_none());
    }

    #[tokio::test]
    async fn test_create_admin_rejects_short_password() {
        let store = MemoryStore::new(4);
        let err = create_admin(&store, "Admin", "admin@example.com", "081234567890", "pendek")
            .await
            .unwrap_err();

        assert_eq!(err.status().as_u16(), 422);
    }

    #[tokio::test]
    async fn test_create_admin_rejects_duplicate_email() {
        let store = MemoryStore::new(4);
        create_admin(&store, "Admin", "admin@example.com", "081234567890", "rahasia123")
            .await
            .unwrap();

        let err = create_admin(&store, "Admin 2", "ADMIN@example.com", "081234567890", "rahasia123")
            .await
            .unwrap_err();
        assert_eq!(err.status().as_u16(), 400);
    }
}
