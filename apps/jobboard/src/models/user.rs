use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Actions gated on more than being signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageJobs,
}

impl Role {
    pub fn allows(self, capability: Capability) -> bool {
        match (self, capability) {
            (Role::Admin, _) => true,
            (Role::User, Capability::ManageJobs) => false,
        }
    }
}

/// A stored account. Field names match the JSON written by earlier versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    /// bcrypt hash.
    pub password: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_upload: Option<String>,
}

impl User {
    pub fn new_unverified(email: String, password_hash: String, token: String, role: Role) -> Self {
        Self {
            email,
            password: password_hash,
            verified: false,
            token: Some(token),
            role,
            phone: None,
            family_phone: None,
            age: None,
            address: None,
            id_number: None,
            id_upload: None,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            email: self.email.clone(),
            verified: self.verified,
            role: self.role,
            phone: self.phone.clone(),
            family_phone: self.family_phone.clone(),
            age: self.age.clone(),
            address: self.address.clone(),
            id_number: self.id_number.clone(),
            id_upload: self.id_upload.clone(),
        }
    }
}

/// Public view of a user: no password hash, no pending token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub verified: bool,
    pub role: Role,
    pub phone: Option<String>,
    pub family_phone: Option<String>,
    pub age: Option<String>,
    pub address: Option<String>,
    pub id_number: Option<String>,
    pub id_upload: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_admin_manages_jobs() {
        assert!(Role::Admin.allows(Capability::ManageJobs));
        assert!(!Role::User.allows(Capability::ManageJobs));
    }

    #[test]
    fn test_legacy_record_defaults_to_user_role() {
        let raw = r#"{"email":"a@b.c","password":"$2b$10$x","verified":true,"familyPhone":"1"}"#;
        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.family_phone.as_deref(), Some("1"));
        assert!(user.token.is_none());
    }

    #[test]
    fn test_cleared_token_is_not_written() {
        let mut user = User::new_unverified(
            "a@b.c".to_string(),
            "hash".to_string(),
            "tok".to_string(),
            Role::User,
        );
        user.token = None;
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("token").is_none());
        assert_eq!(value["role"], "user");
    }
}
