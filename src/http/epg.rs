//! `/api/epg`: serve a guide as JSON or trigger update / cache clear.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct EpgQuery {
    pub method: Option<String>,
    pub source: Option<String>,
    pub redirect: Option<String>,
}

/// Serialize with four-space indentation.
fn pretty_json(value: &serde_json::Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Append the outcome message to a redirect target.
pub fn redirect_target(redirect: &str, message: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    format!("{}?retmessage={}", redirect, encoded)
}

pub async fn epg_handler(
    State(state): State<AppState>,
    Query(query): Query<EpgQuery>,
) -> Response {
    let config = state.config.snapshot();

    let method = query.method.unwrap_or_else(|| "get".to_string());
    let source = query
        .source
        .or_else(|| config.epg_def_method().map(str::to_string))
        .unwrap_or_else(|| "None".to_string());

    if !config.valid_epg_methods().contains(&source) {
        return format!("{} Invalid xmltv method", source).into_response();
    }

    let outcome = match method.as_str() {
        "get" => {
            let guide = state.epg.get_epg(&source);
            return match pretty_json(&guide) {
                Ok(body) => (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response(),
                Err(e) => {
                    tracing::error!(source = %source, error = %e, "Failed to serialize EPG");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Failed to serialize EPG").into_response()
                }
            };
        }
        "update" => state.epg.update(&source),
        "clearcache" => state.epg.clear_cache(&source),
        _ => return format!("{} Invalid Method", method).into_response(),
    };

    let message = match outcome {
        Ok(()) => format!("{} Success", method),
        Err(e) => {
            tracing::error!(method = %method, source = %source, error = %e, "EPG action failed");
            format!("{} Failed", method)
        }
    };

    match query.redirect {
        Some(redirect) if !redirect.is_empty() => {
            Redirect::to(&redirect_target(&redirect, &message)).into_response()
        }
        _ => message.into_response(),
    }
}
