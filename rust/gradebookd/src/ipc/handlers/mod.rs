pub mod backup;
pub mod core;
pub mod grades;
pub mod session;
pub mod students;
pub mod subjects;
