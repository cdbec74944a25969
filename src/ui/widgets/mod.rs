pub mod chart_panel;
pub mod sortable_table;
