pub mod driver;
pub mod keymap;
pub mod state;
pub mod theme;
pub mod view;
