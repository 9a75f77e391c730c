//! Per-kind thumbnail generators dispatched by the pipeline.

pub(crate) mod photo;
pub(crate) mod video;
