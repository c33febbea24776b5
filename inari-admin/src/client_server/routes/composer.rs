use axum::{
    extract::{Multipart, Query, State},
    response::{IntoResponse, Redirect},
    Form, Json,
};
use inari_common::{Location, MediaUpload};
use inari_micropub::MediaFile;
use serde::Deserialize;

use crate::{
    client_server::{extractors::SessionCookie, AppState},
    shared::{HttpError, HttpResult},
};

/// Multipart field carrying uploaded photos.
const PHOTO_FIELD: &str = "photo";

pub async fn show(
    State(state): State<AppState>,
    SessionCookie(id): SessionCookie,
) -> HttpResult<impl IntoResponse> {
    Ok(Json(state.composer.show(&id).await?))
}

pub async fn add_photos(
    State(state): State<AppState>,
    SessionCookie(id): SessionCookie,
    mut multipart: Multipart,
) -> HttpResult<impl IntoResponse> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(e.body_text()))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| HttpError::bad_request(e.body_text()))?;
        if data.is_empty() {
            continue;
        }

        files.push(MediaFile {
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }

    let count = files.len();
    let staged = state.composer.add_photos(&id, files).await?;
    tracing::info!(session_id = %id, count, staged, "Photos added");

    Ok(Redirect::to("/composer"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddMediaForm {
    url: String,
    datetime: String,
    lat: String,
    lng: String,
}

pub async fn add_media(
    State(state): State<AppState>,
    SessionCookie(id): SessionCookie,
    Form(form): Form<AddMediaForm>,
) -> HttpResult<impl IntoResponse> {
    if form.url.is_empty() {
        return Err(HttpError::bad_request("url is required"));
    }

    let media = MediaUpload {
        url: form.url,
        published: form.datetime,
        location: Location::from_lat_lng(parse_coordinate(&form.lat), parse_coordinate(&form.lng)),
    };
    state.composer.add_media(&id, media).await?;

    Ok(Redirect::to("/composer"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LocationQuery {
    q: String,
}

pub async fn search_location(
    State(state): State<AppState>,
    SessionCookie(_): SessionCookie,
    Query(query): Query<LocationQuery>,
) -> HttpResult<impl IntoResponse> {
    let locations = state.geocoder.lookup(&query.q).await?;
    Ok(Json(locations))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddLocationForm {
    locality: String,
    region: String,
    country: String,
    lat: String,
    lng: String,
}

pub async fn add_location(
    State(state): State<AppState>,
    SessionCookie(id): SessionCookie,
    Form(form): Form<AddLocationForm>,
) -> HttpResult<impl IntoResponse> {
    let location = Location {
        locality: form.locality,
        region: form.region,
        country: form.country,
        lat: parse_coordinate(&form.lat),
        lng: parse_coordinate(&form.lng),
    };
    state.composer.add_location(&id, location).await?;

    Ok(Redirect::to("/composer"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmitForm {
    content: String,
    h: String,
}

pub async fn submit(
    State(state): State<AppState>,
    SessionCookie(id): SessionCookie,
    Form(form): Form<SubmitForm>,
) -> HttpResult<impl IntoResponse> {
    let h = if form.h.is_empty() { "entry" } else { &form.h };
    let response = state.composer.submit_post(&id, &form.content, h).await?;

    let location = response.location.unwrap_or_else(|| "/composer".to_string());
    Ok(Redirect::to(&location))
}

/// Unparseable coordinates count as unknown.
fn parse_coordinate(value: &str) -> f64 {
    value.trim().parse().unwrap_or(0.0)
}
