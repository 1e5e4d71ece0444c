use serde::{Deserialize, Serialize};

/// Directory profile returned by the identity service.
///
/// `user_name` is the opaque identifier sent to the file service in the
/// `X-User-Id` header; everything else is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub sam_account_name: String,
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub distinguished_name: String,
    #[serde(default)]
    pub description: String,
}

impl User {
    /// Minimal profile for a known user name (no directory lookup).
    pub fn from_user_name(user_name: impl Into<String>) -> Self {
        let user_name = user_name.into();
        Self {
            display_name: user_name.clone(),
            sam_account_name: user_name.clone(),
            name: user_name.clone(),
            user_name,
            employee_id: String::new(),
            email_address: String::new(),
            given_name: String::new(),
            middle_name: None,
            surname: String::new(),
            domain: None,
            distinguished_name: String::new(),
            description: String::new(),
        }
    }

    /// Identifier used to attribute ownership on the server.
    pub fn id(&self) -> &str {
        &self.user_name
    }

    /// Display name, falling back to the user name when the directory has none.
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.user_name
        } else {
            &self.display_name
        }
    }
}
