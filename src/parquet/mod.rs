pub mod deltas;
pub mod grid;
pub mod stations;

pub use deltas::save_deltas;
pub use grid::save_gauge_grid;
pub use stations::save_stations;
