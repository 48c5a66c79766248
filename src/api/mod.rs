//! HTTP surface: service metadata plus the JSON and SSE answer endpoints.

pub mod answer;
pub mod meta;
