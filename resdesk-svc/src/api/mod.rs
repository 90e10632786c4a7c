//! HTTP API handlers for resdesk-svc
//!
//! HTTP REST + SSE surface over the annotated library

pub mod articles;
pub mod chat;
pub mod health;
pub mod reports;
pub mod session;
pub mod sse;
pub mod taxonomy;
pub mod workspace;

pub use articles::article_routes;
pub use chat::chat_routes;
pub use health::health_routes;
pub use reports::report_routes;
pub use session::session_routes;
pub use sse::event_stream;
pub use taxonomy::taxonomy_routes;
pub use workspace::workspace_routes;
