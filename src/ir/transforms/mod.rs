pub mod delegate_visitor;
pub mod parameter_renamer;
pub mod pretty_printer;
pub mod retarget;
pub mod structural_clone;

pub use delegate_visitor::{rewrite_with, DelegateVisitor};
pub use parameter_renamer::{ParameterRenamer, Renamed};
pub use retarget::{MemberRetargeter, RetargetError, Shape};
pub use structural_clone::{deep_clone, StructuralCloner};
