// Credential check and role-based permissions.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use log::{debug, warn};

use crate::portal::config_reader::UserEntry;
use crate::portal::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Role {
    Admin,
    Analyst,
    Viewer,
    Guest,
}

impl FromStr for Role {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "analyst" => Ok(Role::Analyst),
            "viewer" => Ok(Role::Viewer),
            "guest" => Ok(Role::Guest),
            x => whatever!("Unknown role {:?}", x),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Action {
    View,
    Edit,
    Delete,
    Export,
    Predict,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::View => "view",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Export => "export",
            Action::Predict => "predict",
        };
        write!(f, "{}", name)
    }
}

pub fn permits(role: Role, action: Action) -> bool {
    match role {
        Role::Admin => true,
        Role::Analyst => matches!(action, Action::View | Action::Export | Action::Predict),
        Role::Viewer => matches!(action, Action::View | Action::Export),
        Role::Guest => action == Action::View,
    }
}

pub trait AccessGate {
    fn authenticate(&self, username: &str, password: &str) -> bool;

    /// The role of a user. Unknown users are guests.
    fn role_of(&self, username: &str) -> Role;
}

/// A fixed table of users.
#[derive(Debug, Clone)]
pub struct StaticAccessGate {
    users: HashMap<String, (String, Role)>,
}

impl Default for StaticAccessGate {
    fn default() -> Self {
        let mut users = HashMap::new();
        users.insert(
            "admin".to_string(),
            ("password123".to_string(), Role::Admin),
        );
        StaticAccessGate { users }
    }
}

impl StaticAccessGate {
    pub fn from_users(entries: &[UserEntry]) -> PortalResult<StaticAccessGate> {
        let mut users = HashMap::new();
        for e in entries.iter() {
            let role: Role = e.role.parse()?;
            if users
                .insert(e.username.clone(), (e.password.clone(), role))
                .is_some()
            {
                warn!("StaticAccessGate: user {:?} is defined twice", e.username);
            }
        }
        Ok(StaticAccessGate { users })
    }
}

impl AccessGate for StaticAccessGate {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        let res = matches!(self.users.get(username), Some((p, _)) if p == password);
        debug!("authenticate: {:?} -> {}", username, res);
        res
    }

    fn role_of(&self, username: &str) -> Role {
        self.users
            .get(username)
            .map(|(_, role)| *role)
            .unwrap_or(Role::Guest)
    }
}

/// Fails unless the role allows the action.
pub fn require(user: &str, role: Role, action: Action) -> PortalResult<()> {
    ensure!(
        permits(role, action),
        AccessDeniedSnafu {
            user: user.to_string(),
            action,
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_admin() {
        let gate = StaticAccessGate::default();
        assert!(gate.authenticate("admin", "password123"));
        assert!(!gate.authenticate("admin", "password"));
        assert!(!gate.authenticate("mallory", "password123"));
        assert_eq!(gate.role_of("admin"), Role::Admin);
        assert_eq!(gate.role_of("mallory"), Role::Guest);
    }

    #[test]
    fn permission_table() {
        let all = [
            Action::View,
            Action::Edit,
            Action::Delete,
            Action::Export,
            Action::Predict,
        ];
        let allowed = |role: Role| -> Vec<Action> {
            all.iter().cloned().filter(|a| permits(role, *a)).collect()
        };
        assert_eq!(allowed(Role::Admin), all.to_vec());
        assert_eq!(
            allowed(Role::Analyst),
            vec![Action::View, Action::Export, Action::Predict]
        );
        assert_eq!(allowed(Role::Viewer), vec![Action::View, Action::Export]);
        assert_eq!(allowed(Role::Guest), vec![Action::View]);
    }

    #[test]
    fn configured_users() {
        let gate = StaticAccessGate::from_users(&[UserEntry {
            username: "alice".to_string(),
            password: "secret".to_string(),
            role: "viewer".to_string(),
        }])
        .unwrap();
        assert!(gate.authenticate("alice", "secret"));
        assert!(!gate.authenticate("admin", "password123"));
        assert_eq!(gate.role_of("alice"), Role::Viewer);
        assert!(require("alice", Role::Viewer, Action::Export).is_ok());
        assert!(matches!(
            require("alice", Role::Viewer, Action::Predict),
            Err(PortalError::AccessDenied { .. })
        ));
    }
}
