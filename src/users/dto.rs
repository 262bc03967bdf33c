use serde::{Deserialize, Serialize};

use crate::users::repo_types::{PublicUser, UserInformations};

/// Profile form. Extra fields the client sends along are ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub is_connect: bool,
    pub informations: Option<UserInformations>,
}

/// `{status, data}` envelope of the user endpoints.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}
