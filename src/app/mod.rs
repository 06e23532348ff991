pub mod ports;
pub mod valuation_use_case;
