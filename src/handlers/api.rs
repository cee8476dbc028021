use axum::extract::State;
use serde_json::{Value, json};
use tracing::debug;

use crate::db::models::UserProfile;
use crate::db::{Record, Session};
use crate::error::{ApiResponse, GatewayError, GatewayResult};
use crate::middleware::auth::{Caller, require_auth};
use crate::middleware::dispatch::ApiRequest;
use crate::query::QuerySpec;
use crate::router::GatewayState;

/// GET /api/{method}/{args..} -> runs one API method and wraps its data in
/// the response envelope.
pub async fn api_handler(
    State(state): State<GatewayState>,
    caller: Caller,
    request: ApiRequest,
) -> Result<ApiResponse, GatewayError> {
    let method = request.arg(0).unwrap_or_default().to_ascii_lowercase();
    debug!(method = %method, args = request.len(), "dispatching API call");

    let data = match method.as_str() {
        "all" => all_rows(&state, &caller, &request).await?,
        "find" => find_rows(&state, &caller, &request).await?,
        "get" => get_row(&state, &caller, &request).await?,
        "auth" => check_auth(&state, &request).await?,
        _ => return Err(GatewayError::MethodNotFound(method)),
    };
    Ok(ApiResponse::ok(data))
}

/// all/{table}[/{fields}]
async fn all_rows(
    state: &GatewayState,
    caller: &Caller,
    req: &ApiRequest,
) -> GatewayResult<Value> {
    req.ensure_min_args(2)?;
    let table = req.arg(1).unwrap_or_default();
    let mut spec = QuerySpec::new(table);
    if let Some(fields) = req.arg(2) {
        spec = spec.fields(fields);
    }

    let mut session = state.session().await?;
    authorize(&mut session, state, caller, table).await?;
    let rows = session.get_all(&spec).await?;
    session.quit();
    Ok(rows_value(rows))
}

/// find/{table}/{field}/{comparator}/{value}[/{limit}[/{offset}]]
async fn find_rows(
    state: &GatewayState,
    caller: &Caller,
    req: &ApiRequest,
) -> GatewayResult<Value> {
    req.ensure_min_args(5)?;
    let table = req.arg(1).unwrap_or_default();
    let spec = QuerySpec::new(table)
        .filter(
            req.arg(2).unwrap_or_default(),
            req.arg(3).unwrap_or_default(),
            req.arg(4).unwrap_or_default(),
        )
        .limit(count_arg(req.arg(5)))
        .offset(count_arg(req.arg(6)));

    let mut session = state.session().await?;
    authorize(&mut session, state, caller, table).await?;
    let rows = session.get_all(&spec).await?;
    session.quit();
    Ok(rows_value(rows))
}

/// get/{table}/{field}/{value}[/{comparator}]
async fn get_row(
    state: &GatewayState,
    caller: &Caller,
    req: &ApiRequest,
) -> GatewayResult<Value> {
    req.ensure_min_args(4)?;
    let table = req.arg(1).unwrap_or_default();
    let spec = QuerySpec::new(table).filter(
        req.arg(2).unwrap_or_default(),
        req.arg(4).unwrap_or("eq"),
        req.arg(3).unwrap_or_default(),
    );

    let mut session = state.session().await?;
    authorize(&mut session, state, caller, table).await?;
    let row = session.get_one(&spec).await?;
    session.quit();
    Ok(row.map(Value::Object).unwrap_or(Value::Null))
}

/// auth/{user}/{code}
async fn check_auth(state: &GatewayState, req: &ApiRequest) -> GatewayResult<Value> {
    req.ensure_min_args(3)?;
    let user = req.arg(1).unwrap_or_default();
    let code = req.arg(2).unwrap_or_default();

    let mut session = state.session().await?;
    require_auth(&mut session, &state.settings, user, code, false).await?;
    let profile: Option<UserProfile> = session
        .get_one_as(&QuerySpec::new(&state.settings.profiles_table).filter("code", "eq", user))
        .await?;
    session.quit();

    Ok(json!({
        "user": user,
        "administrator": profile.is_some_and(|p| p.is_admin()),
    }))
}

/// Protected tables need an administrator; everything else needs valid
/// credentials only when the gateway is configured to require them.
async fn authorize(
    session: &mut Session,
    state: &GatewayState,
    caller: &Caller,
    table: &str,
) -> GatewayResult<()> {
    let admin = state.settings.is_protected(table);
    if !admin && !state.settings.require_auth {
        return Ok(());
    }
    let creds = caller.credentials()?;
    require_auth(session, &state.settings, &creds.user_id, &creds.auth_code, admin).await?;
    Ok(())
}

/// Non-numeric, non-positive or out-of-range counts mean "no limit"/"no offset".
fn count_arg(arg: Option<&str>) -> u64 {
    arg.and_then(|s| s.parse::<i64>().ok())
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0)
}

fn rows_value(rows: Vec<Record>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_args_default_to_zero() {
        assert_eq!(count_arg(Some("25")), 25);
        assert_eq!(count_arg(Some("-1")), 0);
        assert_eq!(count_arg(Some("ten")), 0);
        assert_eq!(count_arg(None), 0);
        assert_eq!(count_arg(Some("0")), 0);
        assert_eq!(count_arg(Some("9223372036854775807")), i64::MAX as u64);
        assert_eq!(count_arg(Some("18446744073709551615")), 0);
    }
}
