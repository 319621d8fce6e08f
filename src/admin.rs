use tracing::warn;

use crate::error::CoreError;

/// Membership test against a static admin list
pub fn is_admin(user_id: u64, admin_ids: &[u64]) -> bool {
    admin_ids.contains(&user_id)
}

/// Admin allow-list, fixed at startup from `[telegram].admin_ids`
#[derive(Debug, Clone, Default)]
pub struct AdminGate {
    ids: Vec<u64>,
}

impl AdminGate {
    pub fn new(admin_ids: &[u64]) -> Self {
        let mut ids = admin_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        is_admin(user_id, &self.ids)
    }

    pub fn authorize(&self, user_id: u64) -> Result<(), CoreError> {
        if self.is_admin(user_id) {
            Ok(())
        } else {
            warn!("Denied admin access for user {}", user_id);
            Err(CoreError::Denied { user_id })
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
