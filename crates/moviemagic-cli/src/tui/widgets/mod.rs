pub mod help_bar;
pub mod mode_bar;
pub mod text_input;
