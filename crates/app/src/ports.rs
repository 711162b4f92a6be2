//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod event_bus;
pub mod log_store;
pub mod rule_repo;
pub mod sender;
pub mod template_repo;

pub use event_bus::EventEmitter;
pub use log_store::LogStore;
pub use rule_repo::RuleRepository;
pub use sender::{
    ChannelSenders, ChatSender, DeliveryError, EmailSender, NotificationSender, PushSender,
    WebhookSender,
};
pub use template_repo::TemplateRepository;
