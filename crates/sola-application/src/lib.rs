//! Application layer: the chat session coordinator and the scheduled task
//! service, wiring core state machines to the network edge and storage.

pub mod chat_session;
pub mod scheduler_service;


pub use chat_session::{run_session, ChatSession, SessionDeps, SessionOutput};
pub use scheduler_service::ScheduledTaskService;
