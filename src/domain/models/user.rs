use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i32);
impl UserId {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user that has not been persisted yet.
///
/// Without an id, saving it inserts a new row and lets the database assign
/// the id. With an id, saving it upserts the row carrying that identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    id: Option<UserId>,
    username: String,
    nickname: String,
    password: String,
}

impl NewUser {
    pub fn new(username: String, nickname: String, password: String) -> Self {
        Self {
            id: None,
            username,
            nickname,
            password,
        }
    }

    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<UserId> {
        self.id
    }
    pub fn username(&self) -> &str {
        &self.username
    }
    pub fn nickname(&self) -> &str {
        &self.nickname
    }
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// A persisted user. The id is assigned by the store and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: String,
    nickname: String,
    password: String,
}

impl User {
    pub fn reconstruct(id: UserId, username: String, nickname: String, password: String) -> Self {
        Self {
            id,
            username,
            nickname,
            password,
        }
    }

    // getters only
    pub fn id(&self) -> UserId {
        self.id
    }
    pub fn username(&self) -> &str {
        &self.username
    }
    pub fn nickname(&self) -> &str {
        &self.nickname
    }
    pub fn password(&self) -> &str {
        &self.password
    }
}
