//! Request extractors with envelope-shaped rejections.

mod query;

pub use query::Query;
