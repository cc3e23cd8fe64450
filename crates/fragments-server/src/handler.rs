use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use bytes::Bytes;
use fragments_convert::{plan, Converted};
use fragments_core::{Fragment, FragmentListing};
use fragments_types::{FragmentId, MediaType};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::error::{ServerError, ServerResult};
use crate::response::Envelope;
use crate::router::AppState;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FragmentBody {
    pub fragment: Fragment,
}

#[derive(Debug, Serialize)]
pub struct ListBody {
    pub fragments: FragmentListing,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub expand: Option<String>,
}

/// Health check. Never cached.
pub async fn health() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-cache")],
        Envelope::ok(HealthBody {
            name: "fragments",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

pub async fn create_fragment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<impl IntoResponse> {
    let media = content_type(&headers)?;
    let body = read_body(body, state.max_body_bytes)?;

    let mut fragment = Fragment::for_owner(identity.owner, media);
    fragment.save(&state.storage).await?;
    fragment.set_data(&state.storage, body).await?;

    let location = format!("{}/v1/fragments/{}", base_url(&state, &headers), fragment.id());
    tracing::info!(
        id = %fragment.id(),
        owner = %fragment.owner_id(),
        content_type = %fragment.content_type(),
        size = fragment.size(),
        "created fragment"
    );
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Envelope::ok(FragmentBody { fragment }),
    ))
}

pub async fn list_fragments(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListQuery>,
) -> ServerResult<Envelope<ListBody>> {
    let expand = matches!(query.expand.as_deref(), Some("1" | "true"));
    let fragments = Fragment::by_user(&state.storage, &identity.owner, expand).await?;
    Ok(Envelope::ok(ListBody { fragments }))
}

/// Serve a payload, converted when the path carries an extension
/// (`/v1/fragments/<id>.<ext>`).
pub async fn get_fragment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(raw): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let (id, extension) = split_extension(&raw);
    let fragment = load(&state, &identity, id).await?;
    let payload = fragment.get_data(&state.storage).await?;

    let converted = match extension {
        None => Converted {
            body: payload,
            content_type: fragment.content_type().to_string(),
        },
        Some(ext) => convert(fragment.content_type(), ext, payload).await?,
    };
    Ok(([(header::CONTENT_TYPE, converted.content_type)], converted.body))
}

pub async fn get_info(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ServerResult<Envelope<FragmentBody>> {
    let fragment = load(&state, &identity, &id).await?;
    Ok(Envelope::ok(FragmentBody { fragment }))
}

/// Replace a fragment's payload. The type is fixed at creation.
pub async fn update_fragment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<Envelope<FragmentBody>> {
    let media = content_type(&headers)?;
    let body = read_body(body, state.max_body_bytes)?;
    let mut fragment = load(&state, &identity, &id).await?;

    if media.base() != fragment.content_type().base() {
        return Err(ServerError::BadRequest(format!(
            "Content-Type {} does not match fragment type {}",
            media.essence(),
            fragment.mime_type()
        )));
    }
    fragment.set_data(&state.storage, body).await?;
    tracing::info!(id = %fragment.id(), size = fragment.size(), "updated fragment");
    Ok(Envelope::ok(FragmentBody { fragment }))
}

pub async fn delete_fragment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ServerResult<Envelope<serde_json::Map<String, serde_json::Value>>> {
    let fragment_id = parse_id(&id)?;
    if !Fragment::delete(&state.storage, &identity.owner, &fragment_id).await? {
        return Err(ServerError::NotFound(id));
    }
    tracing::info!(id = %fragment_id, "deleted fragment");
    Ok(Envelope::ok(serde_json::Map::new()))
}

fn content_type(headers: &HeaderMap) -> ServerResult<MediaType> {
    let value = headers
        .get(header::CONTENT_TYPE)
        .ok_or_else(|| ServerError::UnsupportedMediaType("missing Content-Type".into()))?
        .to_str()
        .map_err(|_| ServerError::UnsupportedMediaType("unreadable Content-Type".into()))?;
    MediaType::parse(value).map_err(|e| ServerError::UnsupportedMediaType(e.to_string()))
}

fn read_body(body: Result<Bytes, BytesRejection>, limit: usize) -> ServerResult<Bytes> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge { limit }
        } else {
            ServerError::BadRequest(rejection.body_text())
        }
    })
}

fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(url) = &state.api_url {
        return url.clone();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

/// Split `<id>.<ext>` into its parts. A path without a dot, or with an
/// empty side, is all id.
fn split_extension(raw: &str) -> (&str, Option<&str>) {
    match raw.rsplit_once('.') {
        Some((id, ext)) if !id.is_empty() && !ext.is_empty() => (id, Some(ext)),
        _ => (raw, None),
    }
}

fn parse_id(raw: &str) -> ServerResult<FragmentId> {
    FragmentId::new(raw).map_err(|_| ServerError::NotFound(raw.to_string()))
}

async fn load(state: &AppState, identity: &Identity, raw: &str) -> ServerResult<Fragment> {
    let id = parse_id(raw)?;
    Fragment::by_id(&state.storage, &identity.owner, &id)
        .await?
        .ok_or_else(|| ServerError::NotFound(raw.to_string()))
}

/// Plan, then apply. Rendering and transcoding run on the blocking pool.
async fn convert(stored: &MediaType, extension: &str, payload: Bytes) -> ServerResult<Converted> {
    let conversion = plan(stored, extension)?;
    if !conversion.is_cpu_bound() {
        return Ok(conversion.apply(payload)?);
    }
    let converted = tokio::task::spawn_blocking(move || conversion.apply(payload))
        .await
        .map_err(|e| ServerError::Internal(format!("conversion task failed: {e}")))??;
    Ok(converted)
}
