//! Visualize a track as a rendered map image or interactively on the terminal
pub mod route;
pub mod scrubber;
