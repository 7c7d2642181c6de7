//! Storefront customer account as returned by the login endpoint.

use serde::{Deserialize, Serialize};

/// A logged-in storefront user. Only `id` is guaranteed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        User {
            id: id.into(),
            phone_number: None,
            first_name: None,
            last_name: None,
        }
    }

    /// First and last name joined, falling back to the phone number, then the id.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        self.phone_number.clone().unwrap_or_else(|| self.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_names() {
        let mut user = User::new("u1");
        user.first_name = Some("Aziza".into());
        user.last_name = Some("Karimova".into());
        user.phone_number = Some("+998901234567".into());
        assert_eq!(user.display_name(), "Aziza Karimova");
    }

    #[test]
    fn display_name_falls_back() {
        let mut user = User::new("u1");
        assert_eq!(user.display_name(), "u1");
        user.phone_number = Some("+998901234567".into());
        assert_eq!(user.display_name(), "+998901234567");
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let user: User = serde_json::from_str(r#"{"id":"u9"}"#).unwrap();
        assert_eq!(user, User::new("u9"));
    }
}
