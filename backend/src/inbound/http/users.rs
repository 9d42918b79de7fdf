//! Account HTTP handlers.
//!
//! ```text
//! POST /api/v1/register
//!   {"name":"Ana","email":"ana@municipio.cl","password":"...","role":"ciudadano"}
//! POST /api/v1/login {"email":"ana@municipio.cl","password":"..."}
//! GET /api/v1/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Error, LoginCredentials, LoginOutcome, LoginValidationError, Registration,
    RegistrationValidationError, UserProfile, UserValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerIdentity;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, field_error, require};

/// Registration body for `POST /api/v1/register`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "Ana Rojas")]
    pub name: Option<String>,
    #[schema(example = "ana@municipio.cl")]
    pub email: Option<String>,
    pub password: Option<String>,
    /// `ciudadano` or `operador`.
    #[schema(example = "ciudadano")]
    pub role: Option<String>,
}

/// Login body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ana@municipio.cl")]
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public account view.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[schema(example = "ciudadano")]
    pub role: String,
}

impl From<UserProfile> for UserResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            name: profile.name.as_str().to_owned(),
            email: profile.email.as_str().to_owned(),
            role: profile.role.as_str().to_owned(),
        }
    }
}

/// Successful login payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// RFC 3339 expiry of `token`.
    pub expires_at: String,
    pub user: UserResponse,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            token: outcome.token.as_str().to_owned(),
            token_type: "Bearer".to_owned(),
            expires_at: outcome.expires_at.to_rfc3339(),
            user: outcome.profile.into(),
        }
    }
}

fn user_error_code(err: &UserValidationError) -> &'static str {
    match err {
        UserValidationError::InvalidId => "invalid_uuid",
        UserValidationError::EmptyName => "empty_name",
        UserValidationError::NameTooLong { .. } => "name_too_long",
        UserValidationError::EmptyEmail => "empty_email",
        UserValidationError::MalformedEmail => "malformed_email",
        UserValidationError::EmailTooLong { .. } => "email_too_long",
        UserValidationError::UnknownRole { .. } => "unknown_role",
    }
}

fn map_registration_error(err: RegistrationValidationError) -> Error {
    let code = match &err {
        RegistrationValidationError::Account(inner) => user_error_code(inner),
        RegistrationValidationError::PasswordTooShort { .. } => "password_too_short",
        RegistrationValidationError::PasswordTooLong { .. } => "password_too_long",
    };
    field_error(FieldName::new(err.field()), code, err.to_string())
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyEmail => {
            field_error(FieldName::new("email"), "empty_email", err.to_string())
        }
        LoginValidationError::EmptyPassword => {
            field_error(FieldName::new("password"), "empty_password", err.to_string())
        }
    }
}

fn parse_registration(payload: RegisterRequest) -> Result<Registration, Error> {
    let name = require(payload.name, FieldName::new("name"))?;
    let email = require(payload.email, FieldName::new("email"))?;
    let password = require(payload.password, FieldName::new("password"))?;
    let role = require(payload.role, FieldName::new("role"))?;
    Registration::try_from_parts(&name, &email, &password, &role).map_err(map_registration_error)
}

fn parse_login(payload: LoginRequest) -> Result<LoginCredentials, Error> {
    let email = require(payload.email, FieldName::new("email"))?;
    let password = require(payload.password, FieldName::new("password"))?;
    LoginCredentials::try_from_parts(&email, &password).map_err(map_login_validation_error)
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = parse_registration(payload.into_inner())?;
    let profile = state.auth.register(registration).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(profile)))
}

/// Exchange credentials for a bearer token.
///
/// Wrong passwords and unknown emails yield the same 401 body.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials = parse_login(payload.into_inner())?;
    let outcome = state.auth.login(credentials).await?;
    Ok(web::Json(outcome.into()))
}

/// Profile of the bearer token's owner.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    caller: BearerIdentity,
) -> ApiResult<web::Json<UserResponse>> {
    let profile = state.auth.current_user(caller.identity()).await?;
    Ok(web::Json(profile.into()))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::inbound::http::test_utils::in_memory_state;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().app_data(web::Data::new(state)).service(
            web::scope("/api/v1")
                .service(register)
                .service(login)
                .service(current_user),
        )
    }

    fn registration(email: &str, role: &str) -> Value {
        json!({
            "name": "Ana",
            "email": email,
            "password": "correct-horse",
            "role": role,
        })
    }

    async fn body(res: actix_web::dev::ServiceResponse) -> Value {
        let bytes = actix_test::read_body(res).await;
        serde_json::from_slice(&bytes).expect("JSON body")
    }

    #[actix_web::test]
    async fn register_login_and_me_round_trip() {
        let app = actix_test::init_service(test_app(in_memory_state())).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/register")
                .set_json(registration("Ana@Municipio.cl", "ciudadano"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created = body(res).await;
        assert_eq!(created["email"], "ana@municipio.cl");
        assert_eq!(created["role"], "ciudadano");

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(json!({"email": "ana@municipio.cl", "password": "correct-horse"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let session = body(res).await;
        assert_eq!(session["tokenType"], "Bearer");
        assert_eq!(session["user"]["id"], created["id"]);
        let token = session["token"].as_str().expect("token string").to_owned();

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/me")
                .insert_header(("Authorization", format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body(res).await["name"], "Ana");
    }

    #[actix_web::test]
    async fn duplicate_registration_is_conflict() {
        let app = actix_test::init_service(test_app(in_memory_state())).await;
        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/api/v1/register")
                    .set_json(registration("ana@municipio.cl", "ciudadano"))
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), expected);
        }
    }

    #[rstest]
    #[case(
        json!({"name": "Ana", "email": "ana@x.cl", "password": "short", "role": "ciudadano"}),
        "password",
        "password_too_short"
    )]
    #[case(
        json!({"name": "Ana", "email": "ana@x.cl", "password": "correct-horse", "role": "admin"}),
        "role",
        "unknown_role"
    )]
    #[case(
        json!({"name": "Ana", "email": "ana", "password": "correct-horse", "role": "ciudadano"}),
        "email",
        "malformed_email"
    )]
    #[case(
        json!({"email": "ana@municipio.cl", "password": "correct-horse", "role": "ciudadano"}),
        "name",
        "missing_field"
    )]
    #[actix_web::test]
    async fn register_rejects_invalid_input(
        #[case] payload: Value,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let app = actix_test::init_service(test_app(in_memory_state())).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/register")
                .set_json(payload)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let value = body(res).await;
        assert_eq!(value["code"], "invalid_request");
        assert_eq!(value["details"]["field"], field);
        assert_eq!(value["details"]["code"], code);
    }

    #[rstest]
    #[case(json!({}), "email", "missing_field")]
    #[case(json!({"email": "ana@municipio.cl"}), "password", "missing_field")]
    #[case(json!({"password": "correct-horse"}), "email", "missing_field")]
    #[case(json!({"email": "   ", "password": "correct-horse"}), "email", "empty_email")]
    #[case(json!({"email": "ana@municipio.cl", "password": ""}), "password", "empty_password")]
    #[actix_web::test]
    async fn login_rejects_incomplete_bodies(
        #[case] payload: Value,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let app = actix_test::init_service(test_app(in_memory_state())).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(payload)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let value = body(res).await;
        assert_eq!(value["details"]["field"], field);
        assert_eq!(value["details"]["code"], code);
    }

    #[rstest]
    #[case("ana@municipio.cl", "wrong-password")]
    #[case("nadie@municipio.cl", "correct-horse")]
    #[actix_web::test]
    async fn login_failures_share_one_response(#[case] email: &str, #[case] password: &str) {
        let app = actix_test::init_service(test_app(in_memory_state())).await;
        actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/register")
                .set_json(registration("ana@municipio.cl", "ciudadano"))
                .to_request(),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(json!({"email": email, "password": password}))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let value = body(res).await;
        assert_eq!(value["message"], "invalid credentials");
        assert!(value.get("details").is_none());
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Bearer v1.forged.token"))]
    #[actix_web::test]
    async fn me_requires_a_valid_token(#[case] header: Option<&str>) {
        let app = actix_test::init_service(test_app(in_memory_state())).await;
        let mut req = actix_test::TestRequest::get().uri("/api/v1/me");
        if let Some(value) = header {
            req = req.insert_header(("Authorization", value));
        }

        let res = actix_test::call_service(&app, req.to_request()).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
