use crate::accounts::models::{
    Account, AccountStatus, DashboardData, RegisterRequest, RegisterResponse, Role,
};
use crate::email::{send_detached, MailKind, Mailer};
use crate::error::{AppError, AppResult};
use crate::referral::ReferralResolver;
use crate::store::Store;
use crate::tasks::models::TaskStatus;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

const CODE_GENERATION_ATTEMPTS: usize = 100;

/// Account directory - registration, session rotation and closure.
///
/// Token issuance and password handling live with the auth collaborator;
/// this only owns the account records themselves.
pub struct AccountDirectory {
    store: Arc<Store>,
    mailer: Arc<dyn Mailer>,
}

pub(crate) fn generate_referral_code() -> String {
    use rand::{distributions::Alphanumeric, Rng};
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}

impl AccountDirectory {
    pub fn new(store: Arc<Store>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<RegisterResponse> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let account = {
            let mut state = self.store.write().await;

            if state.accounts.values().any(|a| a.email == request.email) {
                return Err(AppError::Validation("email already registered".into()));
            }

            // An invalid referral code is stored as "no referrer", never
            // rejected - registration must not fail on a mistyped code.
            let referred_by = request
                .referred_by
                .as_deref()
                .and_then(|code| ReferralResolver::resolve(&state, code))
                .map(|referrer| referrer.referral_code.clone());

            let mut referral_code = None;
            for _ in 0..CODE_GENERATION_ATTEMPTS {
                let candidate = generate_referral_code();
                if !state.accounts.values().any(|a| a.referral_code == candidate) {
                    referral_code = Some(candidate);
                    break;
                }
            }
            let referral_code = referral_code.ok_or_else(|| {
                AppError::Internal("could not generate a unique referral code".into())
            })?;

            let account = Account {
                id: Uuid::new_v4(),
                email: request.email,
                country: request.country,
                wallet: Decimal::ZERO,
                role: Role::Worker,
                status: AccountStatus::Active,
                verified: false,
                referral_code,
                referred_by,
                session: None,
                created_at: Utc::now(),
            };
            state.accounts.insert(account.id, account.clone());
            account
        };

        send_detached(
            self.mailer.clone(),
            account.email.clone(),
            Uuid::new_v4().to_string(),
            MailKind::Verification,
        );

        info!(account = %account.id, "account registered");
        Ok(RegisterResponse {
            account_id: account.id,
            referral_code: account.referral_code,
        })
    }

    /// Rotate the single active-session marker, invalidating every token
    /// issued before this call. Returns the new session id.
    pub async fn begin_session(&self, account_id: Uuid) -> AppResult<Uuid> {
        let mut state = self.store.write().await;
        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| AppError::NotFound(format!("account {account_id} not found")))?;
        if !account.is_active() {
            return Err(AppError::Forbidden("account suspended".into()));
        }
        let session = Uuid::new_v4();
        account.session = Some(session);
        Ok(session)
    }

    /// Explicit account closure - the only way an account is ever removed
    pub async fn close(&self, account_id: Uuid) -> AppResult<()> {
        let mut state = self.store.write().await;
        state
            .accounts
            .remove(&account_id)
            .ok_or_else(|| AppError::NotFound(format!("account {account_id} not found")))?;
        info!(account = %account_id, "account closed");
        Ok(())
    }

    pub async fn dashboard(&self, account_id: Uuid) -> AppResult<DashboardData> {
        let state = self.store.read().await;
        let account = state.account(account_id)?;
        let today = Utc::now().date_naive();

        let mut todays_earning = Decimal::ZERO;
        let mut completed_tasks = 0u64;
        for attempt in state.attempts.values() {
            if attempt.worker == account_id
                && attempt.completed
                && attempt.created_at.date_naive() == today
            {
                todays_earning += attempt.payment;
                completed_tasks += 1;
            }
        }

        let live_campaigns = state
            .tasks
            .values()
            .filter(|t| t.owner == account_id && t.status == TaskStatus::Active)
            .count() as u64;

        Ok(DashboardData {
            wallet_balance: account.wallet,
            referral_code: account.referral_code.clone(),
            todays_earning,
            completed_tasks,
            live_campaigns,
        })
    }
}
