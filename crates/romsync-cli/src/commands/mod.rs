pub mod bootstrap;
pub mod cheats;
