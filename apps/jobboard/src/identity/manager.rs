use tracing::info;

use crate::errors::AppError;
use crate::identity::password::{hash_password, verify_password};
use crate::identity::token::issue_token;
use crate::models::user::{Role, User, UserProfile};
use crate::store::{Collection, RecordStore};

/// Parameters for creating a new account.
pub struct RegistrationParams<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub bcrypt_cost: u32,
    /// The account created with this address gets the admin role.
    pub admin_email: &'a str,
}

/// Profile fields sent by the user. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub phone: Option<String>,
    pub family_phone: Option<String>,
    pub age: Option<String>,
    pub address: Option<String>,
    pub id_number: Option<String>,
    /// Stored filename of a freshly uploaded ID document.
    pub id_upload: Option<String>,
}

/// Creates an unverified account and returns its verification token.
///
/// The duplicate check and the insert run under the users collection lock.
pub async fn register(store: &RecordStore, params: RegistrationParams<'_>) -> Result<String, AppError> {
    let RegistrationParams {
        email,
        password,
        bcrypt_cost,
        admin_email,
    } = params;

    if email.trim().is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }

    let hash = hash_password(password, bcrypt_cost).await?;
    let token = issue_token();
    let role = if email == admin_email {
        Role::Admin
    } else {
        Role::User
    };

    let user = User::new_unverified(email.to_string(), hash, token.clone(), role);
    store
        .update(Collection::Users, move |users: &mut Vec<User>| {
            if users.iter().any(|u| u.email == user.email) {
                return Err(AppError::DuplicateEmail);
            }
            users.push(user);
            Ok(())
        })
        .await?;

    info!("Registered user {email} ({role:?})");
    Ok(token)
}

/// Consumes a verification token and returns the verified email.
pub async fn verify(store: &RecordStore, token: &str) -> Result<String, AppError> {
    let email = store
        .update(Collection::Users, |users: &mut Vec<User>| -> Result<String, AppError> {
            let user = users
                .iter_mut()
                .find(|u| u.token.as_deref() == Some(token))
                .ok_or(AppError::InvalidToken)?;
            user.verified = true;
            user.token = None;
            Ok(user.email.clone())
        })
        .await?;

    info!("Verified user {email}");
    Ok(email)
}

/// Checks credentials. The password is checked before the verified flag.
pub async fn authenticate(store: &RecordStore, email: &str, password: &str) -> Result<String, AppError> {
    let user = find_user(store, email)
        .await
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &user.password).await? {
        return Err(AppError::InvalidCredentials);
    }
    if !user.verified {
        return Err(AppError::NotVerified);
    }

    info!("User {email} signed in");
    Ok(user.email)
}

pub async fn update_profile(
    store: &RecordStore,
    email: &str,
    update: ProfileUpdate,
) -> Result<User, AppError> {
    store
        .update(Collection::Users, move |users: &mut Vec<User>| -> Result<User, AppError> {
            let user = users
                .iter_mut()
                .find(|u| u.email == email)
                .ok_or(AppError::UserNotFound)?;

            let ProfileUpdate {
                phone,
                family_phone,
                age,
                address,
                id_number,
                id_upload,
            } = update;
            assign(&mut user.phone, phone);
            assign(&mut user.family_phone, family_phone);
            assign(&mut user.age, age);
            assign(&mut user.address, address);
            assign(&mut user.id_number, id_number);
            assign(&mut user.id_upload, id_upload);

            Ok(user.clone())
        })
        .await
}

fn assign(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

pub async fn profile(store: &RecordStore, email: &str) -> Result<UserProfile, AppError> {
    find_user(store, email)
        .await
        .map(|u| u.profile())
        .ok_or(AppError::UserNotFound)
}

pub async fn find_user(store: &RecordStore, email: &str) -> Option<User> {
    store
        .load::<User>(Collection::Users)
        .await
        .into_iter()
        .find(|u| u.email == email)
}

/// Grants the admin role to an existing account with `admin_email`.
/// Returns whether a record changed.
pub async fn ensure_admin_role(store: &RecordStore, admin_email: &str) -> Result<bool, AppError> {
    let promoted = store
        .update(Collection::Users, |users: &mut Vec<User>| {
            match users.iter_mut().find(|u| u.email == admin_email) {
                Some(user) if user.role != Role::Admin => {
                    user.role = Role::Admin;
                    Ok::<_, AppError>(true)
                }
                _ => Ok(false),
            }
        })
        .await?;

    if promoted {
        info!("Granted admin role to {admin_email}");
    }
    Ok(promoted)
}
