//! Users and sessions.
//!
//! Passwords are stored and compared in plaintext. This mirrors the demo
//! credential list the application ships with and is unsuitable for any real
//! credential handling.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// The dashboard a user is routed to after login.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  Distributor,
  Consumer,
}

/// A stored account. Emails are unique and compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub name:     String,
  pub email:    String,
  pub password: String,
  pub role:     Role,
}

impl User {
  /// The session record for this user; the password is never copied.
  pub fn session(&self) -> Session {
    Session {
      name:  self.name.clone(),
      email: self.email.clone(),
      role:  self.role,
    }
  }
}

/// The active logged-in user, as held for the lifetime of a client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub name:  String,
  pub email: String,
  pub role:  Role,
}

/// Input to [`crate::store::CredentialStore::register`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  pub name:     String,
  pub email:    String,
  pub password: String,
  pub role:     Role,
}

/// Input to [`crate::store::CredentialStore::update_profile`].
///
/// A password change is requested when `new_password` is set and non-empty;
/// it then requires `current_password` to match the stored password. Blank
/// password fields leave the password unchanged.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  pub name:             String,
  pub email:            String,
  #[serde(default)]
  pub current_password: Option<String>,
  #[serde(default)]
  pub new_password:     Option<String>,
}

impl ProfileUpdate {
  pub fn wants_password_change(&self) -> bool {
    self.new_password.as_deref().is_some_and(|p| !p.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn session_drops_password() {
    let user = User {
      name:     "Admin User".into(),
      email:    "admin@chainleaf.com".into(),
      password: "1234".into(),
      role:     Role::Admin,
    };
    let json = serde_json::to_value(user.session()).unwrap();
    assert!(json.get("password").is_none());
    assert_eq!(json["role"], "admin");
  }

  #[test]
  fn blank_new_password_is_not_a_change() {
    let mut update = ProfileUpdate {
      name:             "Dana".into(),
      email:            "dana@farm.test".into(),
      current_password: Some(String::new()),
      new_password:     Some(String::new()),
    };
    assert!(!update.wants_password_change());
    update.new_password = None;
    assert!(!update.wants_password_change());
    update.new_password = Some("s3cret".into());
    assert!(update.wants_password_change());
  }

  #[test]
  fn role_parses_lowercase() {
    assert_eq!("distributor".parse::<Role>().unwrap(), Role::Distributor);
    assert!("Distributor".parse::<Role>().is_err());
  }
}
