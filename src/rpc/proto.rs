//! Wire messages of the `auth` and `users` services.
//!
//! Messages are plain `prost` structs; the service stubs are generated by
//! `build.rs`. The serde derives let the gateway read and write the same
//! messages as JSON (camelCase field names, absent fields default).

pub mod auth {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct LoginRequest {
        #[prost(string, tag = "1")]
        pub email: String,
    }

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct LoginResponse {
        /// Seconds until the mailed code expires.
        #[prost(uint64, tag = "1")]
        pub expires_in: u64,
    }

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct VerifyRequest {
        #[prost(string, tag = "1")]
        pub email: String,
        #[prost(string, tag = "2")]
        pub code: String,
    }

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct VerifyResponse {
        #[prost(string, tag = "1")]
        pub token: String,
        #[prost(uint64, tag = "2")]
        pub user_id: u64,
        #[prost(uint64, tag = "3")]
        pub expires_in: u64,
    }

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct LogoutRequest {
        #[prost(string, tag = "1")]
        pub token: String,
    }

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct LogoutResponse {}

    include!(concat!(env!("OUT_DIR"), "/twinport.auth.Auth.rs"));
}

pub mod users {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct User {
        #[prost(uint64, tag = "1")]
        pub id: u64,
        #[prost(string, tag = "2")]
        pub email: String,
        #[prost(string, tag = "3")]
        pub name: String,
        /// Unix seconds.
        #[prost(int64, tag = "4")]
        pub created_at: i64,
    }

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct GetUserRequest {
        #[prost(uint64, tag = "1")]
        pub id: u64,
    }

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct CreateUserRequest {
        #[prost(string, tag = "1")]
        pub email: String,
        #[prost(string, tag = "2")]
        pub name: String,
    }

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct UpdateUserRequest {
        #[prost(uint64, tag = "1")]
        pub id: u64,
        #[prost(string, tag = "2")]
        pub name: String,
    }

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct DeleteUserRequest {
        #[prost(uint64, tag = "1")]
        pub id: u64,
    }

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct DeleteUserResponse {}

    include!(concat!(env!("OUT_DIR"), "/twinport.users.Users.rs"));
}
