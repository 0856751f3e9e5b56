pub mod coerce;
pub mod config;
pub mod extract;
pub mod feeds;
pub mod page_source;
pub mod persist;
pub mod pipeline;
pub mod record;
pub mod results;
pub mod segment;
pub mod table;
