// Email template review: fetch from the engine, track per-template approval
// edits against the last-synchronized status, persist only what changed.
// All engine traffic goes through webhook_client via the TemplateBackend seam.

pub mod backend;
pub mod flatten;
pub mod handlers;
pub mod model;
pub mod preview;
pub mod session;
pub mod tracker;

pub use session::ReviewSession;
