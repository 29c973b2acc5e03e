pub mod applier;
pub mod diff_engine;
pub mod session;
pub mod sync_service;

pub use applier::Applier;
pub use diff_engine::diff;
pub use session::{ApprovalSelection, ApprovalSession, SessionRegistry, SessionState, SessionTicket};
pub use sync_service::SyncService;
