pub mod classes;
pub mod core;
pub mod dashboard;
pub mod exams;
pub mod marks;
pub mod payments;
pub mod students;
pub mod subjects;
pub mod years;
