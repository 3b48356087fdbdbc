//! Durable local storage for the Sola client: TOML repositories for
//! conversations and scheduled tasks, the application state store, and the
//! path/atomic-write primitives they share.

pub mod app_state_store;
pub mod conversation_repository;
pub mod paths;
pub mod storage;
pub mod task_repository;

pub use app_state_store::AppStateStore;
pub use conversation_repository::TomlConversationRepository;
pub use task_repository::TomlScheduledTaskRepository;
