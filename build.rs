use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic::codec::ProstCodec";

fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(input)
        .output_type(output)
        .codec_path(CODEC)
        .build()
}

fn main() {
    let auth = Service::builder()
        .name("Auth")
        .package("twinport.auth")
        .method(unary(
            "login",
            "Login",
            "crate::rpc::proto::auth::LoginRequest",
            "crate::rpc::proto::auth::LoginResponse",
        ))
        .method(unary(
            "verify",
            "Verify",
            "crate::rpc::proto::auth::VerifyRequest",
            "crate::rpc::proto::auth::VerifyResponse",
        ))
        .method(unary(
            "logout",
            "Logout",
            "crate::rpc::proto::auth::LogoutRequest",
            "crate::rpc::proto::auth::LogoutResponse",
        ))
        .build();

    let users = Service::builder()
        .name("Users")
        .package("twinport.users")
        .method(unary(
            "get_user",
            "GetUser",
            "crate::rpc::proto::users::GetUserRequest",
            "crate::rpc::proto::users::User",
        ))
        .method(unary(
            "create_user",
            "CreateUser",
            "crate::rpc::proto::users::CreateUserRequest",
            "crate::rpc::proto::users::User",
        ))
        .method(unary(
            "update_user",
            "UpdateUser",
            "crate::rpc::proto::users::UpdateUserRequest",
            "crate::rpc::proto::users::User",
        ))
        .method(unary(
            "delete_user",
            "DeleteUser",
            "crate::rpc::proto::users::DeleteUserRequest",
            "crate::rpc::proto::users::DeleteUserResponse",
        ))
        .build();

    Builder::new().compile(&[auth, users]);
}
