use serde::{Deserialize, Serialize};

/// Row of the credentials table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthRecord {
    pub code: String,
    pub auth: String,
}

/// Row of the profiles table, reduced to what the guard reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub code: String,
    #[serde(default)]
    pub administrator: i64,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.administrator > 0
    }
}
