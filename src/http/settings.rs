//! `/api/settings`: the administrative view of web-exposed options.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::config::effective::ORIGIN_SECTION;
use crate::config::value::coerce_override;
use crate::config::ConfigValue;
use crate::http::server::AppState;

/// Shown instead of a hidden option's value.
pub const MASK: &str = "********";

#[derive(Debug, Serialize)]
pub struct SettingView {
    pub value: ConfigValue,
    pub hidden: bool,
}

#[derive(Debug, Deserialize)]
pub struct SettingUpdate {
    pub section: String,
    pub key: String,
    #[serde(default)]
    pub value: String,
}

pub async fn list_settings(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, BTreeMap<String, SettingView>>> {
    let config = state.config.snapshot();
    let dictpopname = state.config.dictpopname();
    let mut settings: BTreeMap<String, BTreeMap<String, SettingView>> = BTreeMap::new();

    for entry in state.config.schema().entries().filter(|e| e.web_visible()) {
        let live_section = if entry.section == dictpopname {
            ORIGIN_SECTION
        } else {
            entry.section.as_str()
        };
        let hidden = entry.web_hidden();
        let value = if hidden {
            ConfigValue::Str(MASK.to_string())
        } else {
            config.value(live_section, &entry.key)
        };

        settings
            .entry(entry.section.clone())
            .or_default()
            .insert(entry.key.clone(), SettingView { value, hidden });
    }

    Json(settings)
}

pub async fn update_setting(
    State(state): State<AppState>,
    Query(update): Query<SettingUpdate>,
) -> Response {
    let name = format!("{}/{}", update.section, update.key);

    let editable = state
        .config
        .schema()
        .get(&update.section, &update.key)
        .is_some_and(|entry| entry.web_visible());
    if !editable {
        tracing::warn!(option = %name, "Rejected update of option not exposed on the web");
        return (StatusCode::FORBIDDEN, format!("{} Not Editable", name)).into_response();
    }

    let value = coerce_override(&update.value);
    let config = state.config.clone();
    // Config::write holds a std mutex across file I/O.
    let written = tokio::task::spawn_blocking(move || {
        config.write(&update.section, &update.key, value)
    })
    .await;

    match written {
        Ok(Ok(())) => format!("{} Updated", name).into_response(),
        Ok(Err(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{} Update Failed: {}", name, e),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(option = %name, error = %e, "Settings write task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{} Update Failed", name),
            )
                .into_response()
        }
    }
}
