// Domain layer: rule and output models plus the stage port. No dependencies beyond std/serde.

pub mod model;
pub mod ports;
