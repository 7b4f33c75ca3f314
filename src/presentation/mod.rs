pub mod due_view;
