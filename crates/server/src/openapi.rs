use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Country create/update body; required fields are enforced per operation by
/// the validation rule tables.
#[derive(ToSchema)]
pub struct CountryInput {
    pub name: Option<String>,
    pub capital: Option<String>,
    pub population: Option<i64>,
    pub region: Option<String>,
    pub flag_url: Option<String>,
    pub motto: Option<String>,
    pub language: Option<String>,
    pub description: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::countries::list,
        crate::routes::countries::create,
        crate::routes::countries::show,
        crate::routes::countries::update,
        crate::routes::countries::destroy,
        crate::routes::countries::update_flag,
        crate::routes::countries::get_flag,
    ),
    components(schemas(HealthResponse, RegisterRequest, LoginRequest, CountryInput)),
    tags(
        (name = "countries", description = "Country resource"),
        (name = "flags", description = "Flag sub-resource"),
        (name = "auth", description = "Authentication")
    )
)]
pub struct ApiDoc;
