use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::mail::{GatewayError, GmailGateway, MailGateway};

use super::AccountHandle;

/// Ordered set of accounts. An account's position is its identity in every
/// thread key, so the order never changes after startup.
pub struct AccountManager {
    handles: Vec<AccountHandle>,
}

impl AccountManager {
    /// Build a Gmail gateway for every configured account
    pub fn new(config: &Config) -> Result<Self> {
        let mut handles = Vec::with_capacity(config.accounts.len());

        for account in &config.accounts {
            let token_path = Config::token_path(&account.email)?;
            let gateway = GmailGateway::from_token_file(&token_path).with_context(|| {
                format!(
                    "No usable access token for {}. Store one at {}",
                    account.email,
                    token_path.display()
                )
            })?;

            tracing::info!("Loaded account '{}'", account.display_name());
            handles.push(AccountHandle::new(
                account,
                config.notifications_enabled_for(account),
                Arc::new(gateway),
            ));
        }

        Self::from_handles(handles)
    }

    pub fn from_handles(handles: Vec<AccountHandle>) -> Result<Self> {
        if handles.is_empty() {
            anyhow::bail!("No accounts configured");
        }
        Ok(Self { handles })
    }

    /// Get the number of accounts
    pub fn count(&self) -> usize {
        self.handles.len()
    }

    /// Get account handle by index
    pub fn get(&self, index: usize) -> Option<&AccountHandle> {
        self.handles.get(index)
    }

    /// Gateway for an account, or an error a task can report back
    pub fn gateway(&self, index: usize) -> Result<Arc<dyn MailGateway>, GatewayError> {
        self.get(index)
            .map(|h| Arc::clone(&h.gateway))
            .ok_or(GatewayError::InvalidAccount(index))
    }

    /// Iterate over all account handles with indices
    pub fn iter_enumerated(&self) -> impl Iterator<Item = (usize, &AccountHandle)> {
        self.handles.iter().enumerate()
    }

    /// Display names in account order
    pub fn names(&self) -> Vec<String> {
        self.handles.iter().map(|h| h.name.clone()).collect()
    }

    /// True if any account wants new-mail notifications
    pub fn any_notifications(&self) -> bool {
        self.handles.iter().any(|h| h.notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountConfig;
    use crate::mail::mock::MockGateway;

    fn handle(name: &str) -> AccountHandle {
        let config = AccountConfig {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            notifications: None,
        };
        AccountHandle::new(&config, true, Arc::new(MockGateway::new()))
    }

    #[test]
    fn test_empty_manager_is_rejected() {
        assert!(AccountManager::from_handles(Vec::new()).is_err());
    }

    #[test]
    fn test_gateway_lookup() {
        let manager =
            AccountManager::from_handles(vec![handle("Personal"), handle("Work Mail")]).unwrap();

        assert_eq!(manager.count(), 2);
        assert!(manager.gateway(1).is_ok());
        assert_eq!(
            manager.gateway(5).err(),
            Some(GatewayError::InvalidAccount(5))
        );
        assert_eq!(manager.names(), vec!["Personal", "Work Mail"]);
        assert_eq!(manager.get(1).unwrap().email, "work mail@example.com");
    }
}
