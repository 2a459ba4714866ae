mod lifecycle_tests;
mod property_tests;
mod trade_tests;
