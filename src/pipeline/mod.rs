pub mod assemble;
pub mod extraction;
pub mod processor; // Batch orchestration over uploaded files
pub mod schema;
