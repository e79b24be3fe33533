pub mod combine;
pub mod extract;
