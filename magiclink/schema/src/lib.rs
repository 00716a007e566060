pub mod magic_links;
pub mod outbox_events;
