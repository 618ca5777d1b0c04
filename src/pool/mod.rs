pub mod bin;
pub mod lb_pair;
pub mod oracle;
pub mod swap;
