//! Record types served by the demo endpoints

use serde::{Deserialize, Serialize};

/// A user record; fields beyond these are ignored when decoding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// A post record; fields beyond these are ignored when decoding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
}
