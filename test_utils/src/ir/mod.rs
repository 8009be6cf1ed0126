pub mod builders;
pub mod generator;
pub mod inspect;
