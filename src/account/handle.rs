use std::sync::Arc;

use crate::config::AccountConfig;
use crate::mail::MailGateway;

/// One configured account and its gateway
#[derive(Clone)]
pub struct AccountHandle {
    /// Label shown next to each thread
    pub name: String,
    pub email: String,
    /// Whether background refresh additions should notify for this account
    pub notifications: bool,
    pub gateway: Arc<dyn MailGateway>,
}

impl AccountHandle {
    pub fn new(config: &AccountConfig, notifications: bool, gateway: Arc<dyn MailGateway>) -> Self {
        Self {
            name: config.display_name().to_string(),
            email: config.email.clone(),
            notifications,
            gateway,
        }
    }
}

impl std::fmt::Debug for AccountHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountHandle")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("notifications", &self.notifications)
            .finish_non_exhaustive()
    }
}
