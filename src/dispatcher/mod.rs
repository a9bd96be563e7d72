pub mod dispatcher;
mod dispatcher_tests;

pub use dispatcher::Assignment;
pub use dispatcher::Dispatcher;
