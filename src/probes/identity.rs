//! Identity and IAM permission probes.

use tracing::{info, warn};

use super::{conclude, Details, ProbeOutcome, ProbeVerdict, BASIC_AUTH, IAM_PERMISSIONS};
use crate::clock::Clock;
use crate::details;
use crate::provider::{CloudProvider, ProviderResult};

/// Recorded when the caller may not read its own IAM policies
pub const IAM_ACCESS_DENIED: &str = "denied (no IAM read access)";

/// Who am I? Passes iff the identity lookup succeeds.
pub async fn basic_auth_probe(provider: &dyn CloudProvider, clock: &dyn Clock) -> ProbeOutcome {
    conclude(BASIC_AUTH, clock, check_identity(provider).await)
}

async fn check_identity(provider: &dyn CloudProvider) -> ProviderResult<ProbeVerdict> {
    let identity = provider.caller_identity().await?;
    info!(arn = %identity.arn, "Authenticated against {}", provider.name());

    Ok(ProbeVerdict::pass(details! {
        "user_id" => identity.user_id,
        "account_id" => identity.account,
        "arn" => identity.arn,
    }))
}

/// Identity plus, for IAM users, the size of their policy set.
///
/// Being denied the policy listing is recorded as a detail and does not fail
/// the probe; any other listing error does.
pub async fn iam_permissions_probe(
    provider: &dyn CloudProvider,
    clock: &dyn Clock,
) -> ProbeOutcome {
    conclude(IAM_PERMISSIONS, clock, check_iam_permissions(provider).await)
}

async fn check_iam_permissions(provider: &dyn CloudProvider) -> ProviderResult<ProbeVerdict> {
    let identity = provider.caller_identity().await?;

    let mut details = details! {
        "user_arn" => identity.arn.clone(),
        "account_id" => identity.account.clone(),
    };

    if let Some(user_name) = identity.user_name() {
        match count_user_policies(provider, user_name, &mut details).await {
            Ok(()) => {}
            Err(e) if e.is_permission_denied() => {
                warn!(user = user_name, "IAM policy listing denied");
                details.insert("iam_access".to_string(), IAM_ACCESS_DENIED.into());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(ProbeVerdict::pass(details))
}

async fn count_user_policies(
    provider: &dyn CloudProvider,
    user_name: &str,
    details: &mut Details,
) -> ProviderResult<()> {
    let attached = provider.list_attached_user_policies(user_name).await?;
    details.insert("attached_policies_count".to_string(), attached.len().into());

    let inline = provider.list_user_policies(user_name).await?;
    details.insert("inline_policies_count".to_string(), inline.len().into());

    Ok(())
}
