pub mod forward_shipment_scorer;
pub mod project_order_selector;
pub mod reporting_scope_filter;
pub mod reporting_year_query_hydrator;
pub mod roster_hydrator;
pub mod run_summary_side_effect;
pub mod shipment_source;
pub mod stop_validity_filter;
pub mod terminal_period_hydrator;
