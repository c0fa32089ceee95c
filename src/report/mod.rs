pub mod assembler;
pub mod console;
pub mod html;
pub mod report_model;
