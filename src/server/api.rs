//! `GET /generator.php`: JSON front-end to the generator pipeline.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::generator::{GenerateError, GenerateRequest};

use super::AppState;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// `1`, `true`, `yes`, `on` (any case) are true; anything else false.
/// An absent key yields `default`.
fn flag(params: &HashMap<String, String>, key: &str, default: bool) -> bool {
    match params.get(key) {
        None => default,
        Some(v) => matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
    }
}

fn text<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Leading integer of `s` (`"5abc"` → 5); 0 when there is none.
fn leading_int(s: &str) -> i64 {
    let s = s.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end]
        .parse::<i64>()
        .map(|n| sign * n)
        .unwrap_or(if end > 0 { i64::MAX } else { 0 })
}

fn error_response(e: &GenerateError) -> Response {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(e.to_json())).into_response()
}

/// Map query parameters onto a request, filling gaps from config.
pub(super) fn request_from_query(
    params: &HashMap<String, String>,
    state: &AppState,
) -> Result<GenerateRequest, GenerateError> {
    let category = text(params, "c").ok_or(GenerateError::MissingCategoryParam)?;
    let mut req = GenerateRequest::new(category, &state.generator_config);

    let n = params.get("n").map(|n| leading_int(n)).unwrap_or(1);
    req.count = usize::try_from(n).unwrap_or(0).max(1);
    req.img = flag(params, "img", false);
    req.dry = flag(params, "dry", false);
    if let Some(ar) = text(params, "ar") {
        req.aspect_ratio = ar.to_string();
    }
    if let Some(model) = text(params, "model") {
        req.model = model.to_string();
    }
    req.skip_img_existing = flag(params, "skip_img_existing", true);
    req.onebit = flag(params, "onebit", true);
    req.skip_onebit_existing = flag(params, "skip_onebit_existing", true);
    req.api_key = text(params, "key")
        .map(str::to_string)
        .or_else(|| state.api_key.as_deref().map(str::to_string));
    Ok(req)
}

// ── Handler ───────────────────────────────────────────────────────────────────

/// GET /generator.php?c=<cat>&n=&img=&dry=&ar=&model=&key=
pub(super) async fn generate(
    State(state): State<AppState>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Response {
    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => {
            let e = GenerateError::BadQuery(rejection.body_text());
            warn!(code = e.code(), error = %e, "generator query rejected");
            return error_response(&e);
        }
    };
    let req = match request_from_query(&params, &state) {
        Ok(req) => req,
        Err(e) => return error_response(&e),
    };

    match state.generator.run(req).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            warn!(code = e.code(), error = %e, "generator request failed");
            error_response(&e)
        }
    }
}
