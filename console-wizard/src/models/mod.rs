pub mod descriptor;
pub mod kind;
pub mod state;
