pub mod patient;

pub use patient::PatientDirectoryService;
