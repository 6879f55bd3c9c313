pub mod assignment;
pub mod augment;
pub mod batch;
pub mod builder;
pub mod codec;
pub mod coordinator;
pub mod diversify;
pub mod events;
pub mod geometry;
pub mod network;
pub mod path;
pub mod patrol;
pub mod ports;
pub mod search;

pub use assignment::*;
pub use augment::*;
pub use batch::*;
pub use builder::*;
pub use coordinator::*;
pub use diversify::*;
pub use events::*;
pub use geometry::*;
pub use network::*;
pub use path::*;
pub use patrol::*;
pub use ports::*;
pub use search::*;
