use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::{Feature, Permissions};

pub const SESSION_COOKIE_NAME: &str = "cabdesk_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    SubAdmin,
}

/// The signed-in account, stored server-side and keyed by the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    /// Only meaningful for [`Role::SubAdmin`].
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(with = "secret_string")]
    pub access_token: SecretString,
}

impl UserData {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can(&self, feature: Feature) -> bool {
        self.is_admin() || self.permissions.get(feature)
    }

    /// Data that is safe to hand to the browser.
    pub fn profile(&self) -> Profile {
        Profile {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            permissions: self.permissions,
        }
    }
}

/// [`UserData`] minus the backend token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub permissions: Permissions,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can(&self, feature: Feature) -> bool {
        self.is_admin() || self.permissions.get(feature)
    }

    pub fn initial(&self) -> String {
        self.display_name
            .chars()
            .next()
            .unwrap_or('?')
            .to_uppercase()
            .to_string()
    }
}

mod secret_string {
    use secrecy::SecretString;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use secrecy::ExposeSecret;
        serializer.serialize_str(secret.expose_secret())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.into())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn user(role: Role, permissions: Permissions) -> UserData {
        UserData {
            user_id: "u-1".into(),
            email: "ops@example.com".into(),
            display_name: "ops desk".into(),
            role,
            permissions,
            access_token: "tok".to_string().into(),
        }
    }

    #[test]
    fn admin_can_use_everything() {
        let admin = user(Role::Admin, Permissions::none());
        assert!(Feature::ALL.iter().all(|f| admin.can(*f)));
    }

    #[test]
    fn sub_admin_is_limited_to_granted_features() {
        let sub = user(Role::SubAdmin, Permissions::default().toggled(Feature::Drivers));
        assert!(sub.can(Feature::Dashboard));
        assert!(sub.can(Feature::Drivers));
        assert!(!sub.can(Feature::Cabs));
    }

    #[test]
    fn token_survives_json_round_trip_and_profile_drops_it() {
        let data = user(Role::SubAdmin, Permissions::default());
        let json = serde_json::to_string(&data).unwrap();
        let back: UserData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.access_token.expose_secret(), "tok");

        let profile = serde_json::to_value(data.profile()).unwrap();
        assert!(profile.get("access_token").is_none());
        assert_eq!(data.profile().initial(), "O");
    }
}
