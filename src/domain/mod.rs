// Domain layer - containers, streams and the output selection

pub mod model;
