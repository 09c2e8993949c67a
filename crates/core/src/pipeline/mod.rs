pub mod capture_logger;
pub mod capture_loop;
pub mod display_sink;
pub mod mailbox;
pub mod mood_state;
pub mod render_loop;
pub mod resolve_worker;
pub mod session;
pub mod snapshot;

#[cfg(test)]
mod testing;
