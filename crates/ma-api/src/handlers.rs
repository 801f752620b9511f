//! # ma-api Handlers
//!
//! Thin HTTP adapters over the place and user repositories. The caller is
//! resolved from the `Authorization: Bearer <token>` header; the repositories
//! decide whether an anonymous caller may proceed.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use log::warn;
use ma_core::models::{ImageFolder, NewUser, UserId};
use ma_core::traits::{AuthProvider, ImageUploader};
use ma_repo::{PlaceRepository, UserRepository};

use crate::dto::{
    decode_image, CityQuery, ContributionRequest, CreatePlaceRequest, CreateUserRequest, CreatedResponse,
    LikedPostRequest, TextRequest, VoteRequest,
};
use crate::error::ApiResult;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub places: PlaceRepository,
    pub users: UserRepository,
    pub uploader: Arc<dyn ImageUploader>,
    pub auth: Box<dyn AuthProvider>,
}

impl AppState {
    /// Identity behind the request's bearer token, if any.
    pub fn caller(&self, req: &HttpRequest) -> Option<UserId> {
        let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?;
        let caller = self.auth.resolve_token(token);
        if caller.is_none() {
            warn!("Rejected bearer token on {}", req.path());
        }
        caller
    }
}

/// `GET /places` or `GET /places?city=Newark`
pub async fn list_places(data: web::Data<AppState>, query: web::Query<CityQuery>) -> ApiResult<HttpResponse> {
    let listing = match query.into_inner().city {
        Some(city) => data.places.list_by_city(&city).await?,
        None => data.places.fetch_all().await?,
    };
    Ok(HttpResponse::Ok().json(listing))
}

pub async fn get_place(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let place = data.places.fetch(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(place))
}

pub async fn create_place(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreatePlaceRequest>,
) -> ApiResult<HttpResponse> {
    let caller = data.caller(&req);
    let new_place = body.into_inner().into_new_place()?;
    let id = data.places.create(caller.as_ref(), new_place).await?;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/places/{id}")))
        .json(CreatedResponse { id }))
}

pub async fn vote(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<VoteRequest>,
) -> ApiResult<HttpResponse> {
    let place_id = path.into_inner();
    data.places.vote(&place_id, data.caller(&req).as_ref(), body.kind).await?;
    Ok(HttpResponse::Ok().json(data.places.fetch(&place_id).await?))
}

pub async fn add_feature(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<TextRequest>,
) -> ApiResult<HttpResponse> {
    let place_id = path.into_inner();
    data.places.add_feature(&place_id, data.caller(&req).as_ref(), &body.text).await?;
    Ok(HttpResponse::Ok().json(data.places.fetch(&place_id).await?))
}

pub async fn add_comment(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<TextRequest>,
) -> ApiResult<HttpResponse> {
    let place_id = path.into_inner();
    data.places.add_comment(&place_id, data.caller(&req).as_ref(), &body.text).await?;
    Ok(HttpResponse::Ok().json(data.places.fetch(&place_id).await?))
}

/// Registers (or refreshes) the calling user. An attached picture is
/// uploaded first; if that fails the profile keeps its current image.
pub async fn create_user(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let caller = data.caller(&req);
    let body = body.into_inner();

    let mut profile_image_url = body.profile_image_url;
    if let Some(encoded) = body.profile_image.as_deref() {
        let image = decode_image(0, encoded)?;
        match data.uploader.upload(ImageFolder::Profile, image).await {
            Ok(url) => profile_image_url = Some(url),
            Err(err) => warn!("Profile image upload failed: {err:#}"),
        }
    }

    let new_user = NewUser { email: body.email, name: body.name, profile_image_url };
    let user = data.users.create_user(caller.as_ref(), new_user).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn get_user(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let user = data.users.fetch_user(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn add_contribution(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ContributionRequest>,
) -> ApiResult<HttpResponse> {
    let caller = data.caller(&req);
    data.users
        .add_contribution(caller.as_ref(), &body.contribution_id, body.points)
        .await?;
    refreshed_user(&data, caller).await
}

pub async fn add_liked_post(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<LikedPostRequest>,
) -> ApiResult<HttpResponse> {
    let caller = data.caller(&req);
    data.users.add_liked_post(caller.as_ref(), &body.post_id).await?;
    refreshed_user(&data, caller).await
}

async fn refreshed_user(data: &AppState, caller: Option<UserId>) -> ApiResult<HttpResponse> {
    // The mutation already rejected anonymous callers.
    let Some(caller) = caller else {
        return Ok(HttpResponse::NoContent().finish());
    };
    Ok(HttpResponse::Ok().json(data.users.fetch_user(caller.as_str()).await?))
}
