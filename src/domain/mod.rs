// Domain layer: request/response schemas, value types and ports (interfaces).

pub mod model;
pub mod ports;
