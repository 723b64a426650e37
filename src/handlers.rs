use crate::auth::{verify_password, Auth, BearerIdentity};
use crate::database::*;
use crate::error::{log_error, ApiError};
use crate::model::*;
use crate::query::MovieQuery;
use actix_web::{web, Either, HttpResponse};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

type Tera = web::Data<tera::Tera>;
type Db = web::Data<sled::Db>;
type AuthData = web::Data<Auth>;

/// Credentials arrive either as JSON or as an urlencoded form. A body that is
/// neither is treated as empty so the missing-field message still applies.
type CredentialBody = Option<Either<web::Json<CredentialParams>, web::Form<CredentialParams>>>;

#[derive(Deserialize, Default)]
struct CredentialParams {
    username: Option<String>,
    password: Option<String>,
    roles: Option<String>,
}

struct Credentials {
    username: String,
    password: String,
    roles: Option<String>,
}

impl CredentialParams {
    fn from_body(body: CredentialBody) -> Self {
        match body {
            Some(Either::Left(json)) => json.into_inner(),
            Some(Either::Right(form)) => form.into_inner(),
            None => CredentialParams::default(),
        }
    }

    fn require(self) -> Result<Credentials, ApiError> {
        fn present(value: Option<String>, field: &'static str) -> Result<String, ApiError> {
            value
                .filter(|v| !v.is_empty())
                .ok_or(ApiError::MissingField(field))
        }
        let username = present(self.username, "username")?;
        let password = present(self.password, "password")?;
        Ok(Credentials {
            username,
            password,
            roles: self.roles,
        })
    }
}

fn bcrypt_error(err: bcrypt::BcryptError, message: &'static str) -> ApiError {
    match err {
        bcrypt::BcryptError::Truncation(_) => ApiError::PasswordTooLong,
        other => log_error(other, message),
    }
}

#[derive(Serialize, Deserialize)]
struct AccessToken {
    access_token: String,
}

async fn index(
    identity: Option<BearerIdentity>,
    tera: Tera,
    db: Db,
) -> Result<HttpResponse, ApiError> {
    let mut ctx = tera::Context::new();
    if let Some(identity) = identity {
        ctx.insert("user", &identity.username);
    }
    let movies = db
        .movies()
        .map_err(|err| log_error(err, "Database error"))?;
    ctx.insert("movies", &MovieQuery::All.run(movies));
    let body = tera
        .render("index.html", &ctx)
        .map_err(|err| log_error(err, "Template error"))?;
    Ok(HttpResponse::Ok().content_type("text/html").body(body))
}

async fn movies(
    params: web::Query<HashMap<String, String>>,
    db: Db,
) -> Result<HttpResponse, ApiError> {
    let query = MovieQuery::from_params(&params)?;
    debug!("movie query: {:?}", query);
    let movies = db
        .movies()
        .map_err(|err| log_error(err, "Database error"))?;
    Ok(HttpResponse::Ok().json(query.run(movies)))
}

async fn register(body: CredentialBody, db: Db, auth: AuthData) -> Result<HttpResponse, ApiError> {
    let credentials = CredentialParams::from_body(body).require()?;
    if db
        .get_user_by_username(&credentials.username)
        .map_err(|err| log_error(err, "Database error"))?
        .is_some()
    {
        return Err(ApiError::UsernameTaken);
    }
    let password = credentials.password;
    let password_hash = web::block(move || auth.hash_password(&password))
        .await
        .map_err(|err| log_error(err, "Hashing error"))?
        .map_err(|err| bcrypt_error(err, "Hashing error"))?;
    let user = User {
        password_hash,
        username: credentials.username,
        roles: credentials.roles,
    };
    // The index transaction has the final say if a concurrent request won.
    match db
        .add_user(&user)
        .map_err(|err| log_error(err, "Database error"))?
    {
        Some(id) => {
            info!("registered user {} with id {}", user.username, id);
            Ok(HttpResponse::Created().json(UserView::from(user)))
        }
        None => Err(ApiError::UsernameTaken),
    }
}

async fn login(body: CredentialBody, db: Db, auth: AuthData) -> Result<HttpResponse, ApiError> {
    let credentials = CredentialParams::from_body(body).require()?;
    let (_user_id, user) = db
        .get_user_by_username(&credentials.username)
        .map_err(|err| log_error(err, "Database error"))?
        .ok_or(ApiError::UserNotFound)?;
    let password = credentials.password;
    let password_hash = user.password_hash.clone();
    let verified = web::block(move || verify_password(&password, &password_hash))
        .await
        .map_err(|err| log_error(err, "Verification error"))?
        .map_err(|err| bcrypt_error(err, "Verification error"))?;
    if !verified {
        debug!("wrong password for {}", user.username);
        return Err(ApiError::WrongCredentials);
    }
    let access_token = auth
        .issue_token(&user.username)
        .map_err(|err| log_error(err, "Token error"))?;
    Ok(HttpResponse::Ok().json(AccessToken { access_token }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/api/movies", web::get().to(movies))
        .route("/api/authenticate/register", web::post().to(register))
        .route("/api/authenticate/login", web::post().to(login));
}
