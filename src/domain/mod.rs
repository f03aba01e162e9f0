// Domain layer: rule-set models and the ports the stages talk through.

pub mod model;
pub mod ports;
