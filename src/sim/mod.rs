pub mod boosters;
pub mod completion;
pub mod event;
pub mod interaction;
pub mod level;
pub mod player;
pub mod step;
pub mod world;
