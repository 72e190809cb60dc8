pub mod audit_event;
pub mod collection;
pub mod email_notification;
pub mod vault_file;
