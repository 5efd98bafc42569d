pub mod glob_expand;
