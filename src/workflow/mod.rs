pub mod notice;
pub mod session_ctx;
pub mod session_state;
pub mod submit_flow;

pub use notice::SessionNotice;
pub use session_ctx::SessionCtx;
pub use session_state::{SessionCell, SessionState};
pub use submit_flow::{RouteTarget, SubmissionApi, SubmitFlow, SubmitReason};
