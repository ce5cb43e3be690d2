pub mod error;
pub mod gateway;
pub mod gmail;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use error::GatewayError;
pub use gateway::{GatewayResult, MailGateway};
pub use gmail::GmailGateway;
pub use types::{Attachment, Message, Page, ThreadKey, ThreadMetadata, ThreadRecord, ThreadStub};
