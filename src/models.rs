use serde::{Deserialize, Serialize};

use crate::model::role::Role;

/// Claims of the bearer tokens this service accepts.
///
/// Tokens are issued by the identity service; we only verify them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Employee id the token was issued for
    pub sub: u64,
    pub username: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
