pub mod attendance;
pub mod department;
pub mod person;
pub mod role;
