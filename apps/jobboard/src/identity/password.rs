//! bcrypt hashing, run on the blocking pool so request threads stay free.

use anyhow::anyhow;
use tracing::warn;

use crate::errors::AppError;

pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(anyhow!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(anyhow!("Failed to hash password: {e}")))
}

/// Returns `Ok(false)` on mismatch. A stored hash bcrypt cannot parse also
/// counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();

    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow!("Password verification task failed: {e}")))?;

    match outcome {
        Ok(matches) => Ok(matches),
        Err(e) => {
            warn!("Stored password hash could not be checked: {e}");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hash = hash_password("hunter22", 4).await.unwrap();
        assert_ne!(hash, "hunter22");
        assert!(verify_password("hunter22", &hash).await.unwrap());
        assert!(!verify_password("hunter23", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let a = hash_password("same", 4).await.unwrap();
        let b = hash_password("same", 4).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_garbage_hash_is_a_mismatch() {
        assert!(!verify_password("pw", "not-a-bcrypt-hash").await.unwrap());
    }
}
