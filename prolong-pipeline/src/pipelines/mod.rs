pub mod prolongation;
