pub mod parse_plans;
