use crate::accounts::models::Account;
use crate::store::State;

/// Maps a referral code to a live referring account.
///
/// Used once at registration (an invalid code is stored as "no referrer")
/// and again at settlement time to decide the commission split.
pub struct ReferralResolver;

impl ReferralResolver {
    pub fn resolve<'a>(state: &'a State, code: &str) -> Option<&'a Account> {
        state
            .accounts
            .values()
            .find(|a| a.referral_code == code && a.is_active())
    }
}
