pub mod anchor;
pub mod board;
pub mod event;
pub mod gravity;
pub mod growth;
pub mod level;
pub mod merge;
pub mod motion;
pub mod session;
pub mod snapshot;
pub mod stage;
