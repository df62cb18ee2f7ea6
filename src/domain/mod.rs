// Domain layer: directory data model, DN helpers and the ports the lifecycle
// core talks through.

pub mod dn;
pub mod model;
pub mod ports;
