pub mod expr_node;
pub mod members;
pub mod pipeline;
pub mod rules;
pub mod transforms;
pub mod types;
pub mod visitor;
