use serde::{Deserialize, Serialize};

/// Self-registration body. Role and team are not client-settable; any such
/// fields in the payload are ignored.
#[derive(Deserialize)]
pub struct UserReq {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginReqDto {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user belongs to a team
    pub team_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
