use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub roles: Option<String>,
}

/// What registration hands back; never carries the hash.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct UserView {
    pub username: String,
    pub roles: Option<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView {
            username: user.username,
            roles: user.roles,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    pub name: String,
    pub movie_type: String,
    pub genre: String,
    pub language: String,
    pub runtime: u32,
}
