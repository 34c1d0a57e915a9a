pub mod bindings;
pub mod command_context;
pub mod command_list;
pub mod command_queue;
