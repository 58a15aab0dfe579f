use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::accounts::models::Role;
use crate::api::handler::AppState;
use crate::error::AppError;

/// Identity asserted by the auth gateway in front of this service.
///
/// The gateway verifies credentials and stamps `x-account-id`, `x-role` and
/// `x-session-id` onto the request. The extractor checks the account still
/// exists, is active, and that the session marker matches the account's
/// single live session; a rotated session invalidates every older token.
#[derive(Debug)]
pub struct AuthUser {
    pub account_id: Uuid,
}

fn header_uuid(parts: &Parts, name: &'static str) -> Result<Uuid, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| AppError::Unauthorized(format!("missing or malformed {name} header")))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let account_id = header_uuid(parts, "x-account-id")?;
        let session = header_uuid(parts, "x-session-id")?;
        let claimed_role = parts
            .headers
            .get("x-role")
            .and_then(|v| v.to_str().ok())
            .and_then(Role::parse)
            .ok_or_else(|| AppError::Unauthorized("missing or malformed x-role header".into()))?;

        let store = state.store.read().await;
        let account = store
            .accounts
            .get(&account_id)
            .ok_or_else(|| AppError::Unauthorized("unknown account".into()))?;

        if !account.is_active() {
            return Err(AppError::Forbidden("account suspended".into()));
        }
        if account.session != Some(session) {
            return Err(AppError::Unauthorized("session expired, log in again".into()));
        }
        if account.role != claimed_role {
            return Err(AppError::Unauthorized(format!(
                "role claim does not match account record ({})",
                account.role.as_str()
            )));
        }

        Ok(AuthUser { account_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::models::{Account, AccountStatus};
    use crate::email::LogMailer;
    use crate::store::Store;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    async fn state_with_account(session: Option<Uuid>, status: AccountStatus) -> (AppState, Uuid) {
        let store = Arc::new(Store::new());
        let id = Uuid::new_v4();
        store.write().await.accounts.insert(
            id,
            Account {
                id,
                email: "w@example.com".into(),
                country: None,
                wallet: Decimal::ZERO,
                role: Role::Worker,
                status,
                verified: true,
                referral_code: "WORK01".into(),
                referred_by: None,
                session,
                created_at: Utc::now(),
            },
        );
        let state = AppState::new(store, Arc::new(LogMailer), Uuid::new_v4());
        (state, id)
    }

    fn parts(account: Uuid, role: &str, session: Uuid) -> Parts {
        let request = axum::http::Request::builder()
            .uri("/")
            .header("x-account-id", account.to_string())
            .header("x-role", role)
            .header("x-session-id", session.to_string())
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[tokio::test]
    async fn accepts_a_matching_live_session() {
        let session = Uuid::new_v4();
        let (state, id) = state_with_account(Some(session), AccountStatus::Active).await;
        let mut parts = parts(id, "worker", session);

        let auth = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(auth.account_id, id);
    }

    #[tokio::test]
    async fn rejects_a_rotated_session_marker() {
        let (state, id) = state_with_account(Some(Uuid::new_v4()), AccountStatus::Active).await;
        let mut parts = parts(id, "worker", Uuid::new_v4());

        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn suspended_accounts_are_forbidden() {
        let session = Uuid::new_v4();
        let (state, id) = state_with_account(Some(session), AccountStatus::Suspended).await;
        let mut parts = parts(id, "worker", session);

        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn role_claim_must_match_the_account() {
        let session = Uuid::new_v4();
        let (state, id) = state_with_account(Some(session), AccountStatus::Active).await;
        let mut parts = parts(id, "admin", session);

        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
