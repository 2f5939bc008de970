pub mod events;
pub mod handlers;

pub use handlers::EventHandlers;
