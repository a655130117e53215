// Fill runs: the single-flight orchestrator, the notification sink, and the
// registry of live documents (one per browser tab) that runs are started on.

pub mod handlers;
pub mod notify;
pub mod orchestrator;
pub mod sessions;
