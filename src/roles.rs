use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Goalkeeper,
        Role::Defender,
        Role::Midfielder,
        Role::Forward,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Role::Goalkeeper => "GK",
            Role::Defender => "DF",
            Role::Midfielder => "MF",
            Role::Forward => "FW",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Goalkeeper => "Goalkeeper",
            Role::Defender => "Defender",
            Role::Midfielder => "Midfielder",
            Role::Forward => "Forward",
        }
    }

    pub fn from_code(raw: &str) -> Option<Role> {
        let code = raw.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.code().eq_ignore_ascii_case(code))
    }
}

pub fn primary_role(position: &str) -> Option<Role> {
    let first = position.split([',', '/']).next()?;
    Role::from_code(first)
}

/// Bucket used when sorting attributed listing rows.
///
/// Any goalkeeper code wins; otherwise the leading code decides.
pub fn route_role(position: &str) -> Option<Role> {
    let pos = position.trim();
    if pos.contains("GK") {
        return Some(Role::Goalkeeper);
    }
    [Role::Defender, Role::Midfielder, Role::Forward]
        .into_iter()
        .find(|role| pos.starts_with(role.code()))
}
