//! Follow-Graph Walker - which accounts get mirrored

use tracing::{debug, info};

use crate::error::SyncError;
use crate::github::{GitHubClient, Resource};
use crate::model::FollowedUser;
use crate::paginate::Paginator;

/// Every login `root` follows, in fetch order, optionally led by `root` itself
///
/// The follow list is always walked to the end; no page ceiling applies.
pub async fn resolve_targets(
    client: &GitHubClient,
    root: &str,
    include_root: bool,
) -> Result<Vec<String>, SyncError> {
    let following = Paginator::<FollowedUser>::new(client, Resource::Following(root.to_string()))
        .collect_all()
        .await?;

    let mut targets = Vec::with_capacity(following.len() + 1);
    if include_root {
        targets.push(root.to_string());
    }
    targets.extend(following.into_iter().map(|user| user.login));

    info!("Resolved {} accounts to mirror for {}", targets.len(), root);
    debug!("Accounts: {:?}", targets);
    Ok(targets)
}
