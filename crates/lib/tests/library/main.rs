mod builder_tests;
mod common;
mod events_tests;
mod message_tests;
