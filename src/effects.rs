pub mod blend;
pub mod blur;
pub mod composite;
