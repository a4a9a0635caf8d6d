pub mod collector;
pub mod history;
pub mod parse;
pub mod rate;
pub mod selector;
pub mod snapshot;
pub mod source;
pub mod store;
