use tracing::debug;

use super::domain::{GroupExtension, UserProfile};
use super::events::{DirectoryEvent, DirectoryEventHandler};
use super::repository::DirectoryRepository;
use crate::store::RepositoryError;

/// Keeps user profiles and group extensions in step with their owners.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileProvisioner;

impl<Tx: DirectoryRepository> DirectoryEventHandler<Tx> for ProfileProvisioner {
    fn name(&self) -> &'static str {
        "profile-provisioner"
    }

    fn handle(&self, tx: &mut Tx, event: &DirectoryEvent) -> Result<(), RepositoryError> {
        match event {
            DirectoryEvent::UserSaved { user_id, .. } => {
                let Some(user) = tx.user(*user_id)? else {
                    debug!(%user_id, "no user behind saved event");
                    return Ok(());
                };

                let profile = match tx.profile(user.id)? {
                    Some(mut existing) => {
                        existing.active = user.is_active;
                        existing
                    }
                    None => UserProfile::for_user(&user),
                };
                tx.save_profile(profile)
            }
            DirectoryEvent::GroupCreated { group } => {
                if tx.group_extension(group.id)?.is_some() {
                    return Ok(());
                }
                tx.save_group_extension(GroupExtension::for_group(group))
            }
            _ => Ok(()),
        }
    }
}
