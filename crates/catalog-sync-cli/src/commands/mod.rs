pub mod config;
pub mod context;
pub mod daemon;
pub mod lists;
pub mod lookup;
pub mod virtual_list;
pub mod watching;
